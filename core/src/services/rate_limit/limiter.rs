//! Login throttling contract

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AuthResult;

/// Counter state after recording a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptStatus {
    pub failed_attempts: u32,
    /// Set when this or an earlier failure engaged the lock
    pub locked_until: Option<DateTime<Utc>>,
}

impl AttemptStatus {
    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some()
    }
}

/// Tracks failed logins per identity and enforces lockout
///
/// Each successful [`check_login_attempt`](LoginRateLimiter::check_login_attempt)
/// reserves a slot against the threshold; the caller then reports exactly one
/// outcome: [`record_failed_attempt`](LoginRateLimiter::record_failed_attempt),
/// [`reset_attempts`](LoginRateLimiter::reset_attempts) or
/// [`release_attempt`](LoginRateLimiter::release_attempt).
/// [`AttemptReservation`](super::AttemptReservation) guarantees that even
/// when the attempt is cancelled before reaching an outcome. Implementations
/// must perform each call atomically per identity, across every process that
/// shares the counters.
///
/// Identities are passed already normalised.
#[async_trait]
pub trait LoginRateLimiter: Send + Sync {
    /// Admit or reject a login attempt
    ///
    /// # Returns
    /// * `Ok(())` - Attempt may proceed
    /// * `Err(AuthError::TooManyAttempts)` - Identity is locked or saturated
    /// * `Err(AuthError::StorageUnavailable)` - Counter backend failed
    async fn check_login_attempt(&self, identity: &str) -> AuthResult<()>;

    /// Record a failed attempt, locking the identity at the threshold
    async fn record_failed_attempt(&self, identity: &str) -> AuthResult<AttemptStatus>;

    /// Clear all failures after a successful login
    async fn reset_attempts(&self, identity: &str) -> AuthResult<()>;

    /// Give back a reserved slot when the attempt ended without a verdict
    async fn release_attempt(&self, identity: &str) -> AuthResult<()>;
}
