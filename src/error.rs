use thiserror::Error;

/// Failures reported by a coordination store backend.
///
/// `NodeExists` and `NoNode` are the two outcomes the master treats as benign races during
/// fail-over; everything else aborts the lifecycle step that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Node already exists: {0}")]
    NodeExists(String),

    #[error("No such node: {0}")]
    NoNode(String),

    #[error("Node has children and cannot be deleted non-recursively: {0}")]
    NotEmpty(String),

    #[error("Coordination store failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O failure: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse master configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to encode or decode binary payload: {0}")]
    CodecError(#[from] bincode::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Invalid master configuration: {0}")]
    Config(String),

    #[error("Result type '{requested}' does not match decoder type '{decoder}'")]
    TypeMismatch { requested: String, decoder: String },

    #[error("No master result set for iteration {0}")]
    MissingMasterResult(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
