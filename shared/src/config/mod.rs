//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - Token signing, session policy and refresh cookie
//! - `cache` - Redis connection
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `rate_limit` - Failed login throttling
//!
//! [`AppConfig::load`] layers built-in environment defaults, an optional
//! `config.<env>.toml` file and `TOLLGATE__*` environment variables.

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod rate_limit;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::{AuthConfig, JwtConfig, RefreshCookieConfig, ReuseRevocationScope, SessionPolicyConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::{LoginRateLimitConfig, RateLimitBackend, RateLimitConfig};

/// Prefix of environment variables overriding configuration keys
pub const ENV_PREFIX: &str = "TOLLGATE";

/// Errors raised while assembling [`AppConfig`]
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// A source could not be read or deserialized
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),

    /// The merged configuration is unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig::new("mysql://localhost:3306/tollgate_dev"),
            cache: CacheConfig::default(),
            auth: AuthConfig {
                cookie: RefreshCookieConfig {
                    secure: false,
                    ..Default::default()
                },
                ..Default::default()
            },
            rate_limit: RateLimitConfig::development(),
            logging: LoggingConfig::for_environment(Environment::Development),
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig::new("mysql://prod-db:3306/tollgate").with_max_connections(50),
            cache: CacheConfig::new("redis://prod-cache:6379").with_prefix("tollgate"),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::production(),
            logging: LoggingConfig::for_environment(Environment::Production),
        }
    }

    /// Built-in defaults for an environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::production();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Load configuration for the environment named by `TOLLGATE_ENV`.
    ///
    /// Reads the environment's `.env` file (then `.env`) before resolving
    /// anything, so values placed there behave like real variables.
    pub fn load() -> Result<Self, ConfigLoadError> {
        let env = Environment::from_env();
        dotenvy::from_filename(env.env_file()).ok();
        dotenvy::dotenv().ok();
        Self::load_for(Environment::from_env(), None)
    }

    /// Load configuration for `env`, optionally from an explicit file path
    /// instead of the environment's default file name.
    pub fn load_for(env: Environment, file: Option<&str>) -> Result<Self, ConfigLoadError> {
        let defaults = ::config::Config::try_from(&Self::for_environment(env))?;
        let file_name = file.unwrap_or_else(|| env.config_file());

        let merged = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::with_name(file_name).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = merged.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the auth subsystem unsafe or unusable
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.environment.is_production() && self.auth.jwt.is_using_default_secret() {
            return Err(ConfigLoadError::Invalid(
                "auth.jwt.access_secret must be set in production".to_string(),
            ));
        }
        if self.auth.jwt.access_secret.is_empty() {
            return Err(ConfigLoadError::Invalid("auth.jwt.access_secret is empty".to_string()));
        }
        if self.auth.jwt.refresh_secret.as_deref() == Some(self.auth.jwt.access_secret.as_str()) {
            return Err(ConfigLoadError::Invalid(
                "auth.jwt.refresh_secret must differ from the access secret".to_string(),
            ));
        }
        if self.auth.jwt.access_token_ttl <= 0 || self.auth.jwt.refresh_token_ttl <= 0 {
            return Err(ConfigLoadError::Invalid("token lifetimes must be positive".to_string()));
        }
        if self.auth.session.ipv4_prefix > 32 || self.auth.session.ipv6_prefix > 128 {
            return Err(ConfigLoadError::Invalid("subnet prefix out of range".to_string()));
        }
        if self.rate_limit.login.max_failed_attempts == 0 {
            return Err(ConfigLoadError::Invalid(
                "rate_limit.login.max_failed_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
