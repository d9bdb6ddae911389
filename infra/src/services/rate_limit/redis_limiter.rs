//! Redis-based login rate limiter
//!
//! Counters are shared by every process pointing at the same Redis, so a
//! lockout engaged on one instance is enforced by all of them. Each trait
//! call is one Lua script, which Redis runs atomically.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use tracing::{debug, warn};

use tg_core::clock::Clock;
use tg_core::errors::{AuthError, AuthResult};
use tg_core::services::rate_limit::{mask_identity, AttemptStatus, LoginRateLimitPolicy, LoginRateLimiter};

use crate::cache::RedisClient;
use crate::InfrastructureError;

use super::scripts;

/// Outcome codes returned by the check script
const ADMITTED: i64 = 0;
const LOCKED: i64 = 1;

/// Redis implementation of [`LoginRateLimiter`]
pub struct RedisLoginRateLimiter {
    redis_client: Arc<RedisClient>,
    policy: LoginRateLimitPolicy,
    key_prefix: String,
    clock: Arc<dyn Clock>,
}

impl RedisLoginRateLimiter {
    /// Create a new Redis-based rate limiter
    ///
    /// `key_prefix` namespaces the counters below the client's own prefix.
    pub fn new(
        redis_client: Arc<RedisClient>,
        policy: LoginRateLimitPolicy,
        key_prefix: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            redis_client,
            policy,
            key_prefix: key_prefix.into(),
            clock,
        }
    }

    /// Counter and lock keys for an identity
    fn keys(&self, identity: &str) -> Vec<String> {
        let (counter, lock) = identity_keys(&self.key_prefix, identity);
        vec![self.redis_client.make_key(&counter), self.redis_client.make_key(&lock)]
    }

    fn window_seconds(&self) -> u64 {
        whole_seconds(self.policy.window)
    }

    fn lockout_seconds(&self) -> u64 {
        whole_seconds(self.policy.lockout)
    }

    /// Bound a Redis call by the client's response timeout
    async fn bounded<T, F>(&self, operation: &'static str, identity: &str, call: F) -> AuthResult<T>
    where
        F: Future<Output = Result<T, InfrastructureError>>,
    {
        let limit: Duration = self.redis_client.response_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation = operation, identity = %mask_identity(identity), error = %e, "Rate limiter backend failed");
                Err(AuthError::StorageUnavailable)
            }
            Err(_) => {
                warn!(
                    operation = operation,
                    identity = %mask_identity(identity),
                    timeout_ms = limit.as_millis() as u64,
                    "Rate limiter call timed out"
                );
                Err(AuthError::StorageUnavailable)
            }
        }
    }
}

#[async_trait]
impl LoginRateLimiter for RedisLoginRateLimiter {
    async fn check_login_attempt(&self, identity: &str) -> AuthResult<()> {
        let keys = self.keys(identity);
        let args = [u64::from(self.policy.max_failed_attempts), self.window_seconds()];
        let reply: Vec<i64> = self
            .bounded("check_login_attempt", identity, self.redis_client.eval_script(&scripts::CHECK, &keys, &args))
            .await?;

        match check_outcome(&reply) {
            Some((ADMITTED, _)) => Ok(()),
            Some((LOCKED, seconds)) => Err(AuthError::TooManyAttempts {
                retry_after_seconds: seconds.max(1),
            }),
            Some((_, seconds)) => {
                debug!(identity = %mask_identity(identity), "Login attempt rejected, threshold saturated");
                Err(AuthError::TooManyAttempts {
                    retry_after_seconds: seconds.max(1),
                })
            }
            None => {
                warn!(reply = ?reply, "Unexpected rate limiter script reply");
                Err(AuthError::StorageUnavailable)
            }
        }
    }

    async fn record_failed_attempt(&self, identity: &str) -> AuthResult<AttemptStatus> {
        let keys = self.keys(identity);
        let args = [
            u64::from(self.policy.max_failed_attempts),
            self.window_seconds(),
            self.lockout_seconds(),
        ];
        let reply: Vec<i64> = self
            .bounded(
                "record_failed_attempt",
                identity,
                self.redis_client.eval_script(&scripts::RECORD_FAILURE, &keys, &args),
            )
            .await?;

        let Some(failure) = failure_outcome(&reply) else {
            warn!(reply = ?reply, "Unexpected rate limiter script reply");
            return Err(AuthError::StorageUnavailable);
        };

        if failure.locked_now {
            warn!(
                identity = %mask_identity(identity),
                failed_attempts = failure.failed_attempts,
                lockout_seconds = self.lockout_seconds(),
                "Login locked after repeated failures"
            );
        }

        let now = self.clock.now();
        Ok(AttemptStatus {
            failed_attempts: failure.failed_attempts,
            locked_until: (failure.lock_seconds > 0)
                .then(|| now + ChronoDuration::seconds(failure.lock_seconds as i64)),
        })
    }

    async fn reset_attempts(&self, identity: &str) -> AuthResult<()> {
        let keys = self.keys(identity);
        self.bounded("reset_attempts", identity, self.redis_client.delete(&keys))
            .await?;
        Ok(())
    }

    async fn release_attempt(&self, identity: &str) -> AuthResult<()> {
        let keys = self.keys(identity);
        let _remaining: i64 = self
            .bounded("release_attempt", identity, self.redis_client.eval_script(&scripts::RELEASE, &keys, &[]))
            .await?;
        Ok(())
    }
}

/// Counter and lock key names, before the client prefix is applied
///
/// The identity is wrapped in a hash tag so both keys land in one cluster
/// slot, which multi-key scripts require.
pub(crate) fn identity_keys(prefix: &str, identity: &str) -> (String, String) {
    (
        format!("{}:{{{}}}", prefix, identity),
        format!("{}:lock:{{{}}}", prefix, identity),
    )
}

fn whole_seconds(duration: ChronoDuration) -> u64 {
    duration.num_seconds().max(1) as u64
}

fn check_outcome(reply: &[i64]) -> Option<(i64, u64)> {
    match reply {
        [code, seconds] if *code >= 0 && *seconds >= 0 => Some((*code, *seconds as u64)),
        _ => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct FailureOutcome {
    failed_attempts: u32,
    lock_seconds: u64,
    locked_now: bool,
}

fn failure_outcome(reply: &[i64]) -> Option<FailureOutcome> {
    match reply {
        [failed, seconds, locked_now] if *failed >= 0 && *seconds >= 0 => Some(FailureOutcome {
            failed_attempts: u32::try_from(*failed).ok()?,
            lock_seconds: *seconds as u64,
            locked_now: *locked_now == 1,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_keys_share_hash_tag() {
        let (counter, lock) = identity_keys("login_attempts", "alice@example.com");
        assert_eq!(counter, "login_attempts:{alice@example.com}");
        assert_eq!(lock, "login_attempts:lock:{alice@example.com}");
    }

    #[test]
    fn test_check_outcome_parsing() {
        assert_eq!(check_outcome(&[0, 0]), Some((ADMITTED, 0)));
        assert_eq!(check_outcome(&[1, 840]), Some((LOCKED, 840)));
        assert_eq!(check_outcome(&[2, 1]), Some((2, 1)));
        assert_eq!(check_outcome(&[0]), None);
        assert_eq!(check_outcome(&[1, -2]), None);
    }

    #[test]
    fn test_failure_outcome_parsing() {
        assert_eq!(
            failure_outcome(&[5, 900, 1]),
            Some(FailureOutcome {
                failed_attempts: 5,
                lock_seconds: 900,
                locked_now: true,
            })
        );
        assert_eq!(
            failure_outcome(&[2, 0, 0]),
            Some(FailureOutcome {
                failed_attempts: 2,
                lock_seconds: 0,
                locked_now: false,
            })
        );
        assert_eq!(failure_outcome(&[1, 2]), None);
    }

    #[test]
    fn test_whole_seconds_is_at_least_one() {
        assert_eq!(whole_seconds(ChronoDuration::minutes(15)), 900);
        assert_eq!(whole_seconds(ChronoDuration::milliseconds(10)), 1);
    }
}
