//! Configuration for login throttling

use chrono::Duration;
use tg_shared::config::LoginRateLimitConfig;

/// Thresholds applied per identity
#[derive(Debug, Clone)]
pub struct LoginRateLimitPolicy {
    /// Consecutive failures that engage the lock (default: 5)
    pub max_failed_attempts: u32,
    /// Window in which failures are counted (default: 15 minutes)
    pub window: Duration,
    /// How long the lock lasts (default: 15 minutes)
    pub lockout: Duration,
}

impl Default for LoginRateLimitPolicy {
    fn default() -> Self {
        Self::from(&LoginRateLimitConfig::default())
    }
}

impl From<&LoginRateLimitConfig> for LoginRateLimitPolicy {
    fn from(config: &LoginRateLimitConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts.max(1),
            window: Duration::seconds(config.window_seconds as i64),
            lockout: Duration::seconds(config.lockout_seconds as i64),
        }
    }
}
