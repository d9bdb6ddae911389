//! Login throttling configuration module

use serde::{Deserialize, Serialize};

/// Which backend keeps the failed attempt counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Process-local counters, suitable for a single instance
    Memory,
    /// Shared counters in Redis
    Redis,
}

impl Default for RateLimitBackend {
    fn default() -> Self {
        RateLimitBackend::Memory
    }
}

/// Failed login throttling
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRateLimitConfig {
    /// Number of consecutive failures before the identity is locked
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,

    /// Rolling window in seconds in which failures are counted
    #[serde(default = "default_window")]
    pub window_seconds: u64,

    /// Lock duration in seconds once the threshold is reached
    #[serde(default = "default_lockout")]
    pub lockout_seconds: u64,

    /// Redis key prefix for counters and locks
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for LoginRateLimitConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            window_seconds: default_window(),
            lockout_seconds: default_lockout(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Counter backend
    #[serde(default)]
    pub backend: RateLimitBackend,

    /// Login throttling
    #[serde(default)]
    pub login: LoginRateLimitConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            backend: RateLimitBackend::default(),
            login: LoginRateLimitConfig::default(),
        }
    }
}

impl RateLimitConfig {
    /// Create a development configuration (in-process counters, short lockout)
    pub fn development() -> Self {
        Self {
            backend: RateLimitBackend::Memory,
            login: LoginRateLimitConfig {
                lockout_seconds: 60,
                ..Default::default()
            },
        }
    }

    /// Create a production configuration (shared counters)
    pub fn production() -> Self {
        Self {
            backend: RateLimitBackend::Redis,
            login: LoginRateLimitConfig::default(),
        }
    }
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_window() -> u64 {
    900 // 15 minutes
}

fn default_lockout() -> u64 {
    900 // 15 minutes
}

fn default_key_prefix() -> String {
    String::from("login_attempts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_limits_default() {
        let config = LoginRateLimitConfig::default();
        assert_eq!(config.max_failed_attempts, 5);
        assert_eq!(config.window_seconds, 900);
        assert_eq!(config.lockout_seconds, 900);
    }

    #[test]
    fn test_environment_presets() {
        assert_eq!(RateLimitConfig::development().backend, RateLimitBackend::Memory);
        assert_eq!(RateLimitConfig::production().backend, RateLimitBackend::Redis);
        assert_eq!(RateLimitConfig::development().login.lockout_seconds, 60);
    }
}
