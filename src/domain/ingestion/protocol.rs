use serde::{Deserialize, Serialize};

use crate::domain::results::iteration_result_set::WorkerResultRecord;

/// The message types exchanged between master and workers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Upstream: "here is my result for this iteration".
    WorkerResult(WorkerResultRecord),
    /// Downstream: master result for an iteration. The master never accepts it.
    MasterResult { iteration: u32, bytes: Vec<u8> },
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::WorkerResult(_) => "WorkerResult",
            Payload::MasterResult { .. } => "MasterResult",
        }
    }
}

/// Wrapper carrying the sender alongside every message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender_id: String,
    pub payload: Payload,
}

impl Envelope {
    pub fn worker_result(record: WorkerResultRecord) -> Self {
        Envelope { sender_id: record.worker_id.to_string(), payload: Payload::WorkerResult(record) }
    }
}
