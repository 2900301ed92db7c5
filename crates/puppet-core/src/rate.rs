//! Rate limiting for repeated log lines

use std::time::{Duration, Instant};

/// Lets an action through at most once per interval
///
/// Used to keep hot loops from flooding the log with the same warning.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
    suppressed: u64,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            suppressed: 0,
        }
    }

    /// Returns true if the action may run now
    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading
    pub fn allow_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.suppressed += 1;
                false
            }
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Number of calls refused since the last allowed one, resetting the count
    pub fn take_suppressed(&mut self) -> u64 {
        std::mem::take(&mut self.suppressed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
