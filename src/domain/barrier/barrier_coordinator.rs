use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::domain::barrier::quorum::QuorumPolicy;
use crate::domain::barrier::retry_policy::RetryPolicy;
use crate::domain::utils::log_throttle::LogThrottle;

/// Summary of one completed barrier wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierOutcome {
    pub done_workers: usize,
    pub elapsed: Duration,
    pub polls: u32,
}

/// Blocks the control flow until a [`QuorumPolicy`] holds.
///
/// The number of polls is unbounded. A job whose workers never reach quorum waits here until an
/// outer watchdog stops it.
#[derive(Debug)]
pub struct BarrierCoordinator {
    retry: RetryPolicy,
    progress: LogThrottle,
}

impl BarrierCoordinator {
    pub fn new(retry: RetryPolicy, progress_log_interval: Duration) -> Self {
        Self { retry, progress: LogThrottle::new(progress_log_interval) }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Polls `done_workers` until `quorum` is met, sleeping per the retry policy in between.
    /// `step` only labels the progress log.
    pub async fn wait_for<F>(&self, step: &str, quorum: &QuorumPolicy, done_workers: F) -> BarrierOutcome
    where
        F: Fn() -> usize,
    {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let done = done_workers();
            let elapsed = start.elapsed();

            if quorum.is_terminated(done, elapsed) {
                return BarrierOutcome { done_workers: done, elapsed, polls: attempt + 1 };
            }

            if self.progress.ready() {
                log::info!("{}: {} workers completed, still waiting for {} workers.", step, done, quorum.workers.saturating_sub(done));
            }

            sleep(self.retry.delay(attempt)).await;
            attempt = attempt.saturating_add(1);
        }
    }
}
