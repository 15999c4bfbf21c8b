pub mod barrier_coordinator;
pub mod quorum;
pub mod retry_policy;
