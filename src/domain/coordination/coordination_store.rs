use async_trait::async_trait;

use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lifetime of a node relative to the session that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Survives the creating session; used for everything fail-over depends on.
    Persistent,
    /// Removed when the creating session is closed.
    Ephemeral,
}

/// Client view of a hierarchical, versioned coordination service (ZooKeeper style).
///
/// Paths are absolute, `/`-separated and have no trailing slash. A node can only be created
/// below an existing parent. Every call may block on network I/O.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Creates `path`. An existing node is a silent success unless `fail_if_exists` is set, in
    /// which case [`StoreError::NodeExists`] is returned.
    async fn create_node(&self, path: &str, payload: Option<&[u8]>, mode: CreateMode, fail_if_exists: bool) -> StoreResult<()>;

    /// Overwrites the data of an existing node regardless of its version.
    async fn write_node(&self, path: &str, payload: &[u8]) -> StoreResult<()>;

    /// Deletes `path`, and with `recursive` everything below it.
    async fn delete_node(&self, path: &str, recursive: bool) -> StoreResult<()>;

    /// Returns the node data, `Some(vec![])` for an empty marker node and `None` when the node
    /// does not exist.
    async fn read_node(&self, path: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Names (not full paths) of the direct children of `path`, sorted.
    async fn get_children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Releases the session. Closing twice is a no-op.
    async fn close(&self) -> StoreResult<()>;
}
