use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::domain::coordination::coordination_store::{CoordinationStore, CreateMode, StoreResult};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct ZNode {
    data: Vec<u8>,
    version: u64,
    mode: CreateMode,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Full path -> node. The root `/` is implicit.
    nodes: BTreeMap<String, ZNode>,
    closed: bool,
}

/// Process-local [`CoordinationStore`] with ZooKeeper-like semantics.
///
/// Clones share the same tree, so a test can hand one clone to the master and inspect the
/// other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCoordinationStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version of `path`; 0 right after creation, bumped by every write.
    pub fn version(&self, path: &str) -> Option<u64> {
        let guard = self.inner.read().expect("RwLock poisoned");
        guard.nodes.get(path).map(|node| node.version)
    }

    pub fn exists(&self, path: &str) -> bool {
        let guard = self.inner.read().expect("RwLock poisoned");
        guard.nodes.contains_key(path)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().expect("RwLock poisoned").closed
    }

    /// All paths currently stored, sorted.
    pub fn paths(&self) -> Vec<String> {
        let guard = self.inner.read().expect("RwLock poisoned");
        guard.nodes.keys().cloned().collect()
    }

    fn validate(path: &str) -> StoreResult<()> {
        let well_formed = path.starts_with('/') && path.len() > 1 && !path.ends_with('/') && !path.contains("//");
        if well_formed { Ok(()) } else { Err(StoreError::Backend(format!("invalid path '{}'", path))) }
    }

    fn parent(path: &str) -> Option<&str> {
        match path.rfind('/') {
            Some(0) | None => None,
            Some(idx) => Some(&path[..idx]),
        }
    }

    fn descendant_prefix(path: &str) -> String {
        format!("{}/", path)
    }

    fn ensure_open(inner: &StoreInner) -> StoreResult<()> {
        if inner.closed { Err(StoreError::Backend("store closed".to_string())) } else { Ok(()) }
    }
}

#[async_trait]
impl CoordinationStore for InMemoryCoordinationStore {
    async fn create_node(&self, path: &str, payload: Option<&[u8]>, mode: CreateMode, fail_if_exists: bool) -> StoreResult<()> {
        Self::validate(path)?;
        let mut guard = self.inner.write().expect("RwLock poisoned");
        Self::ensure_open(&guard)?;

        if guard.nodes.contains_key(path) {
            return if fail_if_exists { Err(StoreError::NodeExists(path.to_string())) } else { Ok(()) };
        }

        if let Some(parent) = Self::parent(path) {
            if !guard.nodes.contains_key(parent) {
                return Err(StoreError::NoNode(parent.to_string()));
            }
        }

        let data = payload.map(|p| p.to_vec()).unwrap_or_default();
        guard.nodes.insert(path.to_string(), ZNode { data, version: 0, mode });
        Ok(())
    }

    async fn write_node(&self, path: &str, payload: &[u8]) -> StoreResult<()> {
        Self::validate(path)?;
        let mut guard = self.inner.write().expect("RwLock poisoned");
        Self::ensure_open(&guard)?;

        let node = guard.nodes.get_mut(path).ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        node.data = payload.to_vec();
        node.version += 1;
        Ok(())
    }

    async fn delete_node(&self, path: &str, recursive: bool) -> StoreResult<()> {
        Self::validate(path)?;
        let mut guard = self.inner.write().expect("RwLock poisoned");
        Self::ensure_open(&guard)?;

        if !guard.nodes.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }

        let prefix = Self::descendant_prefix(path);
        let descendants: Vec<String> = guard.nodes.range(prefix.clone()..).take_while(|(key, _)| key.starts_with(&prefix)).map(|(key, _)| key.clone()).collect();

        if !descendants.is_empty() && !recursive {
            return Err(StoreError::NotEmpty(path.to_string()));
        }

        for key in descendants {
            guard.nodes.remove(&key);
        }
        guard.nodes.remove(path);
        Ok(())
    }

    async fn read_node(&self, path: &str) -> StoreResult<Option<Vec<u8>>> {
        Self::validate(path)?;
        let guard = self.inner.read().expect("RwLock poisoned");
        Self::ensure_open(&guard)?;

        Ok(guard.nodes.get(path).map(|node| node.data.clone()))
    }

    async fn get_children(&self, path: &str) -> StoreResult<Vec<String>> {
        Self::validate(path)?;
        let guard = self.inner.read().expect("RwLock poisoned");
        Self::ensure_open(&guard)?;

        if !guard.nodes.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }

        let prefix = Self::descendant_prefix(path);
        let children = guard
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| &key[prefix.len()..])
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();

        Ok(children)
    }

    async fn close(&self) -> StoreResult<()> {
        let mut guard = self.inner.write().expect("RwLock poisoned");
        if guard.closed {
            return Ok(());
        }

        guard.nodes.retain(|_, node| node.mode == CreateMode::Persistent);
        guard.closed = true;
        log::debug!("In-memory coordination store closed.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_requires_existing_parent() {
        let store = InMemoryCoordinationStore::new();

        let err = store.create_node("/app/master", None, CreateMode::Persistent, false).await.unwrap_err();
        assert_eq!(err, StoreError::NoNode("/app".to_string()));

        store.create_node("/app", None, CreateMode::Persistent, false).await.unwrap();
        store.create_node("/app/master", Some(b"x"), CreateMode::Persistent, false).await.unwrap();
        assert_eq!(store.read_node("/app/master").await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn existing_node_only_fails_when_asked() {
        let store = InMemoryCoordinationStore::new();
        store.create_node("/app", Some(b"first"), CreateMode::Persistent, true).await.unwrap();

        store.create_node("/app", Some(b"second"), CreateMode::Persistent, false).await.unwrap();
        let err = store.create_node("/app", Some(b"third"), CreateMode::Persistent, true).await.unwrap_err();

        assert_eq!(err, StoreError::NodeExists("/app".to_string()));
        assert_eq!(store.read_node("/app").await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn write_bumps_version() {
        let store = InMemoryCoordinationStore::new();
        store.create_node("/app", None, CreateMode::Persistent, false).await.unwrap();
        assert_eq!(store.version("/app"), Some(0));

        store.write_node("/app", b"v1").await.unwrap();
        store.write_node("/app", b"v2").await.unwrap();
        assert_eq!(store.version("/app"), Some(2));
        assert_eq!(store.read_node("/app").await.unwrap(), Some(b"v2".to_vec()));

        assert_eq!(store.write_node("/other", b"x").await.unwrap_err(), StoreError::NoNode("/other".to_string()));
    }

    #[tokio::test]
    async fn delete_respects_recursive_flag() {
        let store = InMemoryCoordinationStore::new();
        store.create_node("/app", None, CreateMode::Persistent, false).await.unwrap();
        store.create_node("/app/master", None, CreateMode::Persistent, false).await.unwrap();
        store.create_node("/app/master/1", None, CreateMode::Persistent, false).await.unwrap();
        store.create_node("/apple", None, CreateMode::Persistent, false).await.unwrap();

        assert_eq!(store.delete_node("/app", false).await.unwrap_err(), StoreError::NotEmpty("/app".to_string()));

        store.delete_node("/app", true).await.unwrap();
        assert_eq!(store.paths(), vec!["/apple".to_string()]);
        assert_eq!(store.delete_node("/app", true).await.unwrap_err(), StoreError::NoNode("/app".to_string()));
    }

    #[tokio::test]
    async fn lists_direct_children_only() {
        let store = InMemoryCoordinationStore::new();
        for path in ["/a", "/a/master", "/a/master/0", "/a/master/10", "/a/master/10-split", "/a/master/10-split/0"] {
            store.create_node(path, None, CreateMode::Persistent, false).await.unwrap();
        }

        let children = store.get_children("/a/master").await.unwrap();
        assert_eq!(children, vec!["0".to_string(), "10".to_string(), "10-split".to_string()]);
    }

    #[tokio::test]
    async fn close_drops_ephemeral_nodes_and_rejects_calls() {
        let store = InMemoryCoordinationStore::new();
        store.create_node("/keep", None, CreateMode::Persistent, false).await.unwrap();
        store.create_node("/session", None, CreateMode::Ephemeral, false).await.unwrap();

        store.close().await.unwrap();
        store.close().await.unwrap();

        assert!(store.is_closed());
        assert!(store.exists("/keep"));
        assert!(!store.exists("/session"));
        assert!(matches!(store.read_node("/keep").await, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn rejects_malformed_paths() {
        let store = InMemoryCoordinationStore::new();
        for path in ["", "/", "app", "/app/", "/a//b"] {
            assert!(matches!(store.create_node(path, None, CreateMode::Persistent, false).await, Err(StoreError::Backend(_))), "{}", path);
        }
    }
}
