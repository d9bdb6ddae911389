//! Rate limiter selected by configuration

use std::sync::Arc;

use async_trait::async_trait;

use tg_core::clock::Clock;
use tg_core::errors::AuthResult;
use tg_core::services::rate_limit::{AttemptStatus, InMemoryLoginRateLimiter, LoginRateLimitPolicy, LoginRateLimiter};

use super::RedisLoginRateLimiter;

/// Either the process-local or the Redis limiter, chosen by
/// `rate_limit.backend`
pub enum ConfiguredLoginRateLimiter {
    Memory(InMemoryLoginRateLimiter),
    Redis(RedisLoginRateLimiter),
}

impl ConfiguredLoginRateLimiter {
    pub fn memory(policy: LoginRateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        ConfiguredLoginRateLimiter::Memory(InMemoryLoginRateLimiter::new(policy, clock))
    }

    fn inner(&self) -> &dyn LoginRateLimiter {
        match self {
            ConfiguredLoginRateLimiter::Memory(limiter) => limiter,
            ConfiguredLoginRateLimiter::Redis(limiter) => limiter,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            ConfiguredLoginRateLimiter::Memory(_) => "memory",
            ConfiguredLoginRateLimiter::Redis(_) => "redis",
        }
    }
}

#[async_trait]
impl LoginRateLimiter for ConfiguredLoginRateLimiter {
    async fn check_login_attempt(&self, identity: &str) -> AuthResult<()> {
        self.inner().check_login_attempt(identity).await
    }

    async fn record_failed_attempt(&self, identity: &str) -> AuthResult<AttemptStatus> {
        self.inner().record_failed_attempt(identity).await
    }

    async fn reset_attempts(&self, identity: &str) -> AuthResult<()> {
        self.inner().reset_attempts(identity).await
    }

    async fn release_attempt(&self, identity: &str) -> AuthResult<()> {
        self.inner().release_attempt(identity).await
    }
}
