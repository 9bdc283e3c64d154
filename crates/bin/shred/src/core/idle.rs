//! Inactivity tracking

use std::time::{Duration, Instant};

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Tracks the last user activity. Time is passed in so the guard stays pure.
#[derive(Clone, Copy, Debug)]
pub struct IdleGuard {
    threshold: Duration,
    last_activity: Instant,
}

impl IdleGuard {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_activity: now,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Strictly more than the threshold has passed since the last touch
    pub fn should_lock(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_activity) > self.threshold
    }
}
