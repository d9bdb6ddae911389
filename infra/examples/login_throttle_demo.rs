//! Example demonstrating the Redis-based login rate limiter
//!
//! Run with: cargo run --example login_throttle_demo

use std::sync::Arc;

use tg_core::clock::SystemClock;
use tg_core::errors::AuthError;
use tg_core::services::rate_limit::{LoginRateLimitPolicy, LoginRateLimiter};
use tg_infra::cache::RedisClient;
use tg_infra::services::RedisLoginRateLimiter;
use tg_infra::telemetry::init_tracing;
use tg_shared::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    let redis_client = Arc::new(RedisClient::new(config.cache.clone()).await?);
    let limiter = RedisLoginRateLimiter::new(
        redis_client,
        LoginRateLimitPolicy::from(&config.rate_limit.login),
        config.rate_limit.login.key_prefix.clone(),
        Arc::new(SystemClock),
    );

    let identity = "demo@example.com";
    limiter.reset_attempts(identity).await?;

    println!("\n=== Failing logins for {} ===", identity);
    for attempt in 1..=config.rate_limit.login.max_failed_attempts + 1 {
        match limiter.check_login_attempt(identity).await {
            Ok(()) => {
                let status = limiter.record_failed_attempt(identity).await?;
                println!(
                    "Attempt {}: failed_attempts = {}, locked = {}",
                    attempt,
                    status.failed_attempts,
                    status.is_locked()
                );
            }
            Err(AuthError::TooManyAttempts { retry_after_seconds }) => {
                println!("Attempt {}: rejected, retry after {} seconds", attempt, retry_after_seconds);
            }
            Err(e) => return Err(e.into()),
        }
    }

    limiter.reset_attempts(identity).await?;
    println!("\nCounters cleared");
    Ok(())
}
