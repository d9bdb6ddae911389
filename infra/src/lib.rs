//! # Infrastructure Layer
//!
//! Concrete adapters for the Tollgate auth core:
//! - **Database**: MySQL session store, user lookup and session activity log using SQLx
//! - **Cache**: Redis client used for shared login throttling
//! - **Services**: Redis-backed login rate limiter
//! - **Telemetry**: `tracing-subscriber` initialisation
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis support (default)

use std::sync::Arc;

use tg_core::clock::Clock;
use tg_core::services::{AuthCoordinator, BcryptPasswordVerifier, LoginRateLimitPolicy};
use tg_shared::config::{AppConfig, ConfigLoadError, RateLimitBackend};

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Cache module - Redis client
pub mod cache;

/// Services module - Infrastructure service implementations
pub mod services;

/// Telemetry module - tracing subscriber setup
pub mod telemetry;

#[cfg(feature = "mysql")]
use database::{DatabasePool, MySqlSessionActivityRepository, MySqlSessionStore, MySqlUserLookup};

use cache::RedisClient;
use services::rate_limit::{ConfiguredLoginRateLimiter, RedisLoginRateLimiter};

/// Coordinator wired to the MySQL adapters
#[cfg(feature = "mysql")]
pub type MySqlAuthCoordinator = AuthCoordinator<
    MySqlUserLookup,
    MySqlSessionStore,
    ConfiguredLoginRateLimiter,
    BcryptPasswordVerifier,
    MySqlSessionActivityRepository,
>;

/// Connected backends shared by every request
#[derive(Clone)]
pub struct InfrastructureServices {
    #[cfg(feature = "mysql")]
    database: DatabasePool,
    redis: Option<Arc<RedisClient>>,
}

impl InfrastructureServices {
    /// Connect to every backend the configuration asks for
    ///
    /// Redis is only contacted when the rate limiter backend is `redis`.
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        tracing::info!(environment = %config.environment, "Initializing infrastructure services");

        #[cfg(feature = "mysql")]
        let database = DatabasePool::new(config.database.clone()).await?;

        let redis = match config.rate_limit.backend {
            RateLimitBackend::Redis => Some(Arc::new(RedisClient::new(config.cache.clone()).await?)),
            RateLimitBackend::Memory => None,
        };

        tracing::info!("Infrastructure services initialized successfully");

        Ok(Self {
            #[cfg(feature = "mysql")]
            database,
            redis,
        })
    }

    #[cfg(feature = "mysql")]
    pub fn database(&self) -> &DatabasePool {
        &self.database
    }

    pub fn redis(&self) -> Option<&Arc<RedisClient>> {
        self.redis.as_ref()
    }

    /// Rate limiter for the configured backend
    pub fn login_rate_limiter(&self, config: &AppConfig, clock: Arc<dyn Clock>) -> ConfiguredLoginRateLimiter {
        let policy = LoginRateLimitPolicy::from(&config.rate_limit.login);
        match &self.redis {
            Some(client) => ConfiguredLoginRateLimiter::Redis(RedisLoginRateLimiter::new(
                Arc::clone(client),
                policy,
                config.rate_limit.login.key_prefix.clone(),
                clock,
            )),
            None => ConfiguredLoginRateLimiter::memory(policy, clock),
        }
    }

    /// Build the auth coordinator on top of the MySQL adapters
    #[cfg(feature = "mysql")]
    pub fn auth_coordinator(
        &self,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<MySqlAuthCoordinator, InfrastructureError> {
        let pool = self.database.pool().clone();
        let passwords = BcryptPasswordVerifier::with_default_cost()
            .map_err(|e| InfrastructureError::General(format!("Password verifier setup failed: {}", e)))?;

        Ok(AuthCoordinator::new(
            Arc::new(MySqlUserLookup::new(pool.clone())),
            Arc::new(MySqlSessionStore::new(pool.clone())),
            Arc::new(self.login_rate_limiter(config, Arc::clone(&clock))),
            Arc::new(passwords),
            Arc::new(MySqlSessionActivityRepository::new(pool)),
            &config.auth,
            clock,
        ))
    }
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Subscriber installation error
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<ConfigLoadError> for InfrastructureError {
    fn from(error: ConfigLoadError) -> Self {
        InfrastructureError::Config(error.to_string())
    }
}
