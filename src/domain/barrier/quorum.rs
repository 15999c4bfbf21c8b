use std::time::Duration;

/// Ratios are configured with two decimals, so `2 of 3` has to satisfy `0.67`.
const RATIO_TOLERANCE: f64 = 0.005;
/// Absorbs float noise such as `0.1 * 30 = 2.9999999999999996`.
const FLOAT_EPSILON: f64 = 1e-9;

/// When an iteration may close: every worker reported, or the timeout grace period is over and
/// enough of them did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuorumPolicy {
    pub workers: usize,
    pub min_workers_ratio: f64,
    pub min_workers_timeout: Duration,
}

impl QuorumPolicy {
    pub fn new(workers: usize, min_workers_ratio: f64, min_workers_timeout: Duration) -> Self {
        Self { workers, min_workers_ratio, min_workers_timeout }
    }

    /// Smallest number of reports whose share of `workers` reaches the ratio once the timeout
    /// has passed, never less than one report for a non-empty job.
    ///
    /// The share may fall short of the ratio by [`RATIO_TOLERANCE`], but never by more than half a
    /// worker, so large jobs at `1.0` still need every report.
    pub fn required_workers(&self) -> usize {
        if self.workers == 0 {
            return 0;
        }
        let workers = self.workers as f64;
        let ratio = self.min_workers_ratio.clamp(0.0, 1.0);
        let tolerance = RATIO_TOLERANCE.min(0.5 / workers);
        let required = (workers * (ratio - tolerance) - FLOAT_EPSILON).ceil().max(0.0) as usize;
        required.clamp(1, self.workers)
    }

    pub fn is_terminated(&self, done_workers: usize, elapsed: Duration) -> bool {
        if done_workers >= self.workers {
            return true;
        }
        elapsed >= self.min_workers_timeout && done_workers >= self.required_workers()
    }
}
