use std::time::Duration;

use crate::domain::barrier::quorum::QuorumPolicy;
use crate::domain::coordination::znode_paths::GUAGUA_INIT_STEP;
use crate::domain::master::master_config::MasterConfig;
use crate::domain::results::worker_results::WorkerResults;
use crate::domain::utils::id::ApplicationId;

/// Per-run state shared between the host loop, the compute callback and the
/// [`MasterCoordinator`](crate::domain::master::master_coordinator::MasterCoordinator).
#[derive(Debug)]
pub struct MasterContext<M, W> {
    pub app_id: ApplicationId,
    pub current_iteration: u32,
    pub total_iterations: u32,
    pub workers: usize,
    pub min_workers_ratio: f64,
    pub min_workers_timeout: Duration,
    /// Name the worker results are decoded under.
    pub worker_result_type_name: String,
    /// Filled by the compute callback, persisted in post-iteration.
    pub master_result: Option<M>,
    /// Filled in pre-iteration once the barrier opens.
    pub worker_results: Option<WorkerResults<W>>,
}

impl<M, W> MasterContext<M, W> {
    pub fn new(app_id: ApplicationId, workers: usize, total_iterations: u32, config: &MasterConfig, worker_result_type_name: impl Into<String>) -> Self {
        MasterContext {
            app_id,
            current_iteration: GUAGUA_INIT_STEP,
            total_iterations,
            workers,
            min_workers_ratio: config.min_workers_ratio,
            min_workers_timeout: config.min_workers_timeout,
            worker_result_type_name: worker_result_type_name.into(),
            master_result: None,
            worker_results: None,
        }
    }

    pub fn is_init_iteration(&self) -> bool {
        self.current_iteration == GUAGUA_INIT_STEP
    }

    /// Positions the run after the last iteration whose master result was persisted.
    pub fn resume_at(&mut self, iteration: u32) {
        self.current_iteration = iteration;
    }

    pub fn quorum(&self) -> QuorumPolicy {
        QuorumPolicy::new(self.workers, self.min_workers_ratio, self.min_workers_timeout)
    }

    /// Moves to the next iteration and forgets the previous iteration's results.
    pub fn advance(&mut self) -> u32 {
        self.current_iteration += 1;
        self.master_result = None;
        self.worker_results = None;
        self.current_iteration
    }

    pub fn is_finished(&self) -> bool {
        self.current_iteration >= self.total_iterations
    }
}
