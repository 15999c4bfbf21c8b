use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Lets a caller emit a progress line at most once per `interval`.
///
/// Polling loops call [`LogThrottle::ready`] on every pass and only log when it returns `true`,
/// which keeps the log readable when a barrier spins for minutes.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: Mutex::new(None) }
    }

    /// Returns `true` on the first call and afterwards whenever `interval` has passed since the
    /// last call that returned `true`.
    pub fn ready(&self) -> bool {
        let mut last = self.last.lock().expect("Mutex poisoned");
        let now = Instant::now();

        match *last {
            Some(previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
