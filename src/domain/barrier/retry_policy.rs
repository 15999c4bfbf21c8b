use std::time::Duration;

/// Sleep schedule between two polls of a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    FixedDelay(Duration),
    /// `initial * 2^attempt`, capped at `max`.
    ExponentialBackoff { initial: Duration, max: Duration },
}

impl RetryPolicy {
    pub fn from_settings(fixed: bool, sleep: Duration, max_sleep: Duration) -> Self {
        if fixed { RetryPolicy::FixedDelay(sleep) } else { RetryPolicy::ExponentialBackoff { initial: sleep, max: max_sleep.max(sleep) } }
    }

    /// Delay after the `attempt`-th unsuccessful poll, counting from 0.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            RetryPolicy::FixedDelay(delay) => delay,
            RetryPolicy::ExponentialBackoff { initial, max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}
