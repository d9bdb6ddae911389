//! Failed login bookkeeping per identity.

use chrono::{DateTime, Duration, Utc};

/// Failed attempts for one normalised identity.
///
/// `pending` counts attempts that passed the limiter check and have not yet
/// reported an outcome, so a burst of concurrent requests cannot all slip
/// in under the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttemptCounter {
    pub identity: String,
    pub failed_attempts: u32,
    pub pending: u32,
    pub window_started_at: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptCounter {
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            failed_attempts: 0,
            pending: 0,
            window_started_at: now,
            locked_until: None,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map_or(false, |until| now < until)
    }

    /// True once the counting window or a past lockout has run out
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.locked_until {
            Some(until) => now >= until,
            None => now - self.window_started_at >= window,
        }
    }

    /// Attempts that count against the threshold right now
    pub fn outstanding(&self) -> u32 {
        self.failed_attempts + self.pending
    }

    /// Records one failure and locks once `max_attempts` is reached.
    /// Returns true when this failure engaged the lock.
    pub fn register_failure(&mut self, now: DateTime<Utc>, max_attempts: u32, lockout: Duration) -> bool {
        self.pending = self.pending.saturating_sub(1);
        self.failed_attempts += 1;
        if self.failed_attempts >= max_attempts && self.locked_until.is_none() {
            self.locked_until = Some(now + lockout);
            return true;
        }
        false
    }

    /// Whole seconds until the lock lifts, at least one
    pub fn retry_after(&self, now: DateTime<Utc>) -> u64 {
        self.locked_until
            .map(|until| (until - now).num_seconds().max(1) as u64)
            .unwrap_or(1)
    }
}
