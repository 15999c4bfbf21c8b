use std::sync::Arc;

use crate::domain::results::iteration_result_set::IterationResultSet;
use crate::domain::results::result_serializer::ResultSerializer;
use crate::error::Result;

/// Cursor over the live [`IterationResultSet`] that decodes each payload on demand.
///
/// Restartable, not truly exhausting: when the cursor reaches the end, `next()` returns `None`
/// and rewinds, so the following `next()` starts a fresh traversal from the first record. A
/// caller may therefore iterate the same handle any number of times, for example to check
/// again whether all workers have halted. There is no removal.
pub struct WorkerResults<T> {
    results: IterationResultSet,
    serializer: Arc<dyn ResultSerializer<T>>,
    type_name: String,
    cursor: usize,
}

impl<T> WorkerResults<T> {
    pub(crate) fn new(results: IterationResultSet, serializer: Arc<dyn ResultSerializer<T>>, type_name: String) -> Self {
        Self { results, serializer, type_name, cursor: 0 }
    }

    /// Whether another record is available at the cursor. Does not decode.
    pub fn has_next(&self) -> bool {
        self.cursor < self.results.size()
    }

    /// Number of records currently in the underlying set.
    pub fn len(&self) -> usize {
        self.results.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl<T> Clone for WorkerResults<T> {
    fn clone(&self) -> Self {
        Self { results: self.results.clone(), serializer: self.serializer.clone(), type_name: self.type_name.clone(), cursor: self.cursor }
    }
}

impl<T> std::fmt::Debug for WorkerResults<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerResults").field("type_name", &self.type_name).field("cursor", &self.cursor).field("len", &self.len()).finish()
    }
}

impl<T> Iterator for WorkerResults<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.results.get(self.cursor) {
            Some(record) => {
                self.cursor += 1;
                Some(self.serializer.bytes_to_object(&record.payload, &self.type_name))
            }
            None => {
                self.cursor = 0;
                None
            }
        }
    }
}
