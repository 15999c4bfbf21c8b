use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::results::result_serializer::ResultSerializer;
use crate::domain::results::worker_results::WorkerResults;
use crate::domain::utils::id::WorkerId;

/// One worker's submission for an iteration. Immutable once stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkerResultRecord {
    pub worker_id: WorkerId,
    /// Iteration the worker computed this result for. Informational only.
    pub iteration: u32,
    /// Set by workers acknowledging shutdown during the unregister step.
    pub is_stop_message: bool,
    pub payload: Vec<u8>,
}

impl WorkerResultRecord {
    pub fn new(worker_id: WorkerId, iteration: u32, payload: Vec<u8>) -> Self {
        Self { worker_id, iteration, is_stop_message: false, payload }
    }

    pub fn stop(worker_id: WorkerId, iteration: u32) -> Self {
        Self { worker_id, iteration, is_stop_message: true, payload: Vec::new() }
    }
}

#[derive(Debug, Default)]
struct ResultSetInner {
    /// Append log in arrival order.
    records: Vec<Arc<WorkerResultRecord>>,

    /// Position of each worker's record in `records`.
    index: HashMap<WorkerId, usize>,
}

/// Worker results received for the iteration in flight.
///
/// A worker id is stored at most once; the first record wins and later submissions for the
/// same id are dropped. Clones share the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct IterationResultSet {
    /// Log and index are protected with a single lock so that "absent? then append" is atomic.
    inner: Arc<RwLock<ResultSetInner>>,
}

impl IterationResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` unless its worker already reported in this iteration.
    ///
    /// # Returns
    /// `true` if the record was stored, `false` if it was discarded as a duplicate.
    pub fn append(&self, record: WorkerResultRecord) -> bool {
        let mut guard = self.inner.write().expect("RwLock poisoned");
        if guard.index.contains_key(&record.worker_id) {
            return false;
        }

        let position = guard.records.len();
        guard.index.insert(record.worker_id.clone(), position);
        guard.records.push(Arc::new(record));
        true
    }

    pub fn size(&self) -> usize {
        self.inner.read().expect("RwLock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, worker_id: &WorkerId) -> bool {
        self.inner.read().expect("RwLock poisoned").index.contains_key(worker_id)
    }

    /// Record at `position` in arrival order.
    pub fn get(&self, position: usize) -> Option<Arc<WorkerResultRecord>> {
        self.inner.read().expect("RwLock poisoned").records.get(position).cloned()
    }

    pub fn get_by_worker(&self, worker_id: &WorkerId) -> Option<Arc<WorkerResultRecord>> {
        let guard = self.inner.read().expect("RwLock poisoned");
        let position = *guard.index.get(worker_id)?;
        guard.records.get(position).cloned()
    }

    /// Drops every record and resets the identity index.
    pub fn clear(&self) {
        let mut guard = self.inner.write().expect("RwLock poisoned");
        guard.records.clear();
        guard.index.clear();
    }

    /// Read-only, restartable view of the stored payloads decoded as `T`.
    pub fn to_sequence<T>(&self, serializer: Arc<dyn ResultSerializer<T>>, type_name: impl Into<String>) -> WorkerResults<T> {
        WorkerResults::new(self.clone(), serializer, type_name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(worker: &str, payload: &[u8]) -> WorkerResultRecord {
        WorkerResultRecord::new(WorkerId::new(worker), 1, payload.to_vec())
    }

    #[test]
    fn first_submission_wins() {
        let set = IterationResultSet::new();

        assert!(set.append(record("w1", b"first")));
        assert!(!set.append(record("w1", b"second")));

        assert_eq!(set.size(), 1);
        assert_eq!(set.get_by_worker(&WorkerId::new("w1")).unwrap().payload, b"first".to_vec());
    }

    #[test]
    fn keeps_arrival_order() {
        let set = IterationResultSet::new();
        set.append(record("w2", b"b"));
        set.append(record("w1", b"a"));
        set.append(record("w3", b"c"));

        let order: Vec<String> = (0..set.size()).map(|i| set.get(i).unwrap().worker_id.to_string()).collect();
        assert_eq!(order, vec!["w2", "w1", "w3"]);
        assert!(set.get(3).is_none());
    }

    #[test]
    fn clear_resets_index() {
        let set = IterationResultSet::new();
        set.append(record("w1", b"old"));
        set.clear();

        assert!(set.is_empty());
        assert!(!set.contains(&WorkerId::new("w1")));
        assert!(set.append(record("w1", b"new")));
        assert_eq!(set.get(0).unwrap().payload, b"new".to_vec());
    }

    #[test]
    fn clones_share_state() {
        let set = IterationResultSet::new();
        let handle = set.clone();
        handle.append(record("w1", b"x"));
        assert_eq!(set.size(), 1);
    }
}
