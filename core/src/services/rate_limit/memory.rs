//! In-process login rate limiter

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::domain::entities::LoginAttemptCounter;
use crate::errors::{AuthError, AuthResult};

use super::config::LoginRateLimitPolicy;
use super::identity::mask_identity;
use super::limiter::{AttemptStatus, LoginRateLimiter};

/// Table size at which stale counters are first swept
const DEFAULT_EVICTION_THRESHOLD: usize = 1024;

/// Counters plus the size that triggers the next sweep
struct CounterTable {
    entries: HashMap<String, LoginAttemptCounter>,
    evict_at: usize,
    floor: usize,
}

impl CounterTable {
    fn new(floor: usize) -> Self {
        Self {
            entries: HashMap::new(),
            evict_at: floor,
            floor,
        }
    }

    fn evict_stale(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, c| !c.is_stale(now, window));
        // Next sweep once the live set doubles, so sweeps stay amortised O(1)
        self.evict_at = (self.entries.len() * 2).max(self.floor);
        before - self.entries.len()
    }

    fn maybe_evict(&mut self, now: DateTime<Utc>, window: Duration) {
        if self.entries.len() < self.evict_at {
            return;
        }
        let evicted = self.evict_stale(now, window);
        if evicted > 0 {
            debug!(evicted = evicted, tracked = self.entries.len(), "Evicted stale login counters");
        }
    }
}

/// Rate limiter keeping counters in a mutex-guarded map
///
/// Correct for a single process only; multi-instance deployments need a
/// shared backend. Expired counters are swept whenever the table grows past
/// a threshold.
pub struct InMemoryLoginRateLimiter {
    policy: LoginRateLimitPolicy,
    clock: Arc<dyn Clock>,
    counters: Mutex<CounterTable>,
}

impl InMemoryLoginRateLimiter {
    pub fn new(policy: LoginRateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            counters: Mutex::new(CounterTable::new(DEFAULT_EVICTION_THRESHOLD)),
        }
    }

    /// Set the table size that triggers the first sweep of expired counters
    pub fn with_eviction_threshold(mut self, threshold: usize) -> Self {
        self.counters = Mutex::new(CounterTable::new(threshold.max(1)));
        self
    }

    /// Snapshot of the counter for an identity
    pub async fn counter(&self, identity: &str) -> Option<LoginAttemptCounter> {
        self.counters.lock().await.entries.get(identity).cloned()
    }

    /// Number of identities currently tracked
    pub async fn tracked(&self) -> usize {
        self.counters.lock().await.entries.len()
    }

    /// Drop counters whose window or lock has run out
    pub async fn prune(&self) -> usize {
        let now = self.clock.now();
        self.counters.lock().await.evict_stale(now, self.policy.window)
    }
}

#[async_trait]
impl LoginRateLimiter for InMemoryLoginRateLimiter {
    async fn check_login_attempt(&self, identity: &str) -> AuthResult<()> {
        let now = self.clock.now();
        let mut table = self.counters.lock().await;
        table.maybe_evict(now, self.policy.window);
        let counters = &mut table.entries;

        if counters
            .get(identity)
            .map_or(false, |c| c.is_stale(now, self.policy.window))
        {
            counters.remove(identity);
        }

        let counter = counters
            .entry(identity.to_string())
            .or_insert_with(|| LoginAttemptCounter::new(identity, now));

        if counter.is_locked(now) {
            return Err(AuthError::TooManyAttempts {
                retry_after_seconds: counter.retry_after(now),
            });
        }
        if counter.outstanding() >= self.policy.max_failed_attempts {
            debug!(identity = %mask_identity(identity), "Login attempt rejected, threshold saturated");
            return Err(AuthError::TooManyAttempts {
                retry_after_seconds: 1,
            });
        }

        counter.pending += 1;
        Ok(())
    }

    async fn record_failed_attempt(&self, identity: &str) -> AuthResult<AttemptStatus> {
        let now = self.clock.now();
        let mut table = self.counters.lock().await;
        table.maybe_evict(now, self.policy.window);

        let counter = table
            .entries
            .entry(identity.to_string())
            .or_insert_with(|| LoginAttemptCounter::new(identity, now));
        let locked_now = counter.register_failure(now, self.policy.max_failed_attempts, self.policy.lockout);

        if locked_now {
            warn!(
                identity = %mask_identity(identity),
                failed_attempts = counter.failed_attempts,
                lockout_seconds = self.policy.lockout.num_seconds(),
                "Login locked after repeated failures"
            );
        }

        Ok(AttemptStatus {
            failed_attempts: counter.failed_attempts,
            locked_until: counter.locked_until,
        })
    }

    async fn reset_attempts(&self, identity: &str) -> AuthResult<()> {
        self.counters.lock().await.entries.remove(identity);
        Ok(())
    }

    async fn release_attempt(&self, identity: &str) -> AuthResult<()> {
        if let Some(counter) = self.counters.lock().await.entries.get_mut(identity) {
            counter.pending = counter.pending.saturating_sub(1);
        }
        Ok(())
    }
}
