use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::coordination::coordination_store::{CoordinationStore, CreateMode, StoreResult};
use crate::domain::coordination::znode_paths::{master_node, master_split_chunk_node, master_split_node};
use crate::domain::utils::id::ApplicationId;
use crate::domain::utils::log_throttle::LogThrottle;
use crate::error::{Error, Result, StoreError};

/// Content of `/A/master/<iteration>` for every iteration after the init step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum MasterNodeData {
    Inline(Vec<u8>),
    /// The result lives in `chunks` children of `/A/master/<iteration>-split`.
    Split { chunks: u32, len: u64 },
}

/// Writes, reads and retires the per-iteration master result znodes.
///
/// Results above `split_threshold` bytes are cut into chunk nodes under the split companion.
/// The primary node is created last, so its presence means the whole result is readable.
pub struct MasterResultStore {
    store: Arc<dyn CoordinationStore>,
    split_threshold: usize,
    missing_node_log: LogThrottle,
}

impl MasterResultStore {
    pub fn new(store: Arc<dyn CoordinationStore>, split_threshold: usize, missing_node_log: LogThrottle) -> Self {
        Self { store, split_threshold: split_threshold.max(1), missing_node_log }
    }

    /// Persists `bytes` as the master result of `iteration`.
    ///
    /// # Returns
    /// Whether the result was split. [`StoreError::NodeExists`] means the iteration was already
    /// persisted, e.g. by a master that crashed right after writing it.
    pub async fn publish(&self, app_id: &ApplicationId, iteration: u32, bytes: &[u8]) -> StoreResult<bool> {
        let primary = master_node(app_id, iteration);

        if bytes.len() <= self.split_threshold {
            let data = Self::encode(&MasterNodeData::Inline(bytes.to_vec()))?;
            self.store.create_node(&primary, Some(&data), CreateMode::Persistent, true).await?;
            return Ok(false);
        }

        if self.store.read_node(&primary).await?.is_some() {
            return Err(StoreError::NodeExists(primary));
        }

        let split = master_split_node(app_id, iteration);
        match self.store.delete_node(&split, true).await {
            Ok(()) => log::warn!("Removed leftover split node {} before rewriting it.", split),
            Err(StoreError::NoNode(_)) => {}
            Err(e) => return Err(e),
        }
        self.store.create_node(&split, None, CreateMode::Persistent, true).await?;

        let chunks: Vec<&[u8]> = bytes.chunks(self.split_threshold).collect();
        for (i, chunk) in chunks.iter().copied().enumerate() {
            self.store.create_node(&master_split_chunk_node(app_id, iteration, i), Some(chunk), CreateMode::Persistent, true).await?;
        }

        let header = MasterNodeData::Split { chunks: chunks.len() as u32, len: bytes.len() as u64 };
        self.store.create_node(&primary, Some(&Self::encode(&header)?), CreateMode::Persistent, true).await?;

        log::info!("Master result of iteration {} ({} bytes) split into {} chunks.", iteration, bytes.len(), chunks.len());
        Ok(true)
    }

    /// Reassembles the master result of `iteration`, `None` if it was never persisted.
    pub async fn fetch(&self, app_id: &ApplicationId, iteration: u32) -> Result<Option<Vec<u8>>> {
        let Some(raw) = self.store.read_node(&master_node(app_id, iteration)).await? else {
            return Ok(None);
        };

        match bincode::deserialize::<MasterNodeData>(&raw)? {
            MasterNodeData::Inline(bytes) => Ok(Some(bytes)),
            MasterNodeData::Split { chunks, len } => {
                let mut bytes = Vec::with_capacity(len as usize);
                for i in 0..chunks as usize {
                    let path = master_split_chunk_node(app_id, iteration, i);
                    let chunk = self.store.read_node(&path).await?.ok_or_else(|| Error::Store(StoreError::NoNode(path.clone())))?;
                    bytes.extend_from_slice(&chunk);
                }
                if bytes.len() as u64 != len {
                    return Err(Error::Protocol(format!("split master result of iteration {} has {} bytes, expected {}", iteration, bytes.len(), len)));
                }
                Ok(Some(bytes))
            }
        }
    }

    /// Deletes the znodes of `current_iteration - 2` once `current_iteration >= 3`.
    ///
    /// Iteration 0 (server address) and the two latest iterations are always kept for
    /// fail-over. Missing nodes are logged and ignored, so retiring twice is harmless.
    ///
    /// # Returns
    /// The iteration whose nodes were removed, if any.
    pub async fn retire_stale(&self, app_id: &ApplicationId, current_iteration: u32) -> StoreResult<Option<u32>> {
        let Some(stale) = Self::stale_iteration(current_iteration) else {
            return Ok(None);
        };

        let primary = master_node(app_id, stale);
        let Some(raw) = self.store.read_node(&primary).await? else {
            self.log_missing(&primary);
            // Chunks are written before the primary, so a crash in between leaves them behind.
            self.delete_tolerant(&master_split_node(app_id, stale), true).await?;
            return Ok(None);
        };

        if let Ok(MasterNodeData::Split { .. }) = bincode::deserialize::<MasterNodeData>(&raw) {
            self.delete_tolerant(&master_split_node(app_id, stale), true).await?;
        }

        if self.delete_tolerant(&primary, false).await? { Ok(Some(stale)) } else { Ok(None) }
    }

    /// The iteration retired after `current_iteration` finishes.
    pub fn stale_iteration(current_iteration: u32) -> Option<u32> {
        if current_iteration >= 3 { Some(current_iteration - 2) } else { None }
    }

    async fn delete_tolerant(&self, path: &str, recursive: bool) -> StoreResult<bool> {
        match self.store.delete_node(path, recursive).await {
            Ok(()) => Ok(true),
            Err(StoreError::NoNode(_)) => {
                self.log_missing(path);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn log_missing(&self, path: &str) {
        if self.missing_node_log.ready() {
            log::warn!("No such node: {}", path);
        }
    }

    fn encode(data: &MasterNodeData) -> StoreResult<Vec<u8>> {
        bincode::serialize(data).map_err(|e| StoreError::Backend(format!("cannot encode master node: {}", e)))
    }
}
