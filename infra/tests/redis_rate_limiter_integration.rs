//! Integration tests for the Redis-based login rate limiter
//!
//! These tests require Redis to be running locally on port 6379 (or at
//! `REDIS_URL`).
//! Run with: cargo test --test redis_rate_limiter_integration -- --ignored

use std::sync::Arc;

use chrono::Duration;

use tg_core::clock::{Clock, ManualClock};
use tg_core::errors::AuthError;
use tg_core::services::rate_limit::{LoginRateLimitPolicy, LoginRateLimiter};
use tg_infra::cache::RedisClient;
use tg_infra::services::RedisLoginRateLimiter;
use tg_shared::config::CacheConfig;

async fn create_test_limiter_with_policy(policy: LoginRateLimitPolicy) -> RedisLoginRateLimiter {
    let config = CacheConfig::new(
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
    )
    .with_prefix("tollgate_test");
    let redis_client = RedisClient::new(config)
        .await
        .expect("Failed to create Redis client");

    RedisLoginRateLimiter::new(
        Arc::new(redis_client),
        policy,
        "login_attempts",
        Arc::new(ManualClock::starting_now()),
    )
}

async fn create_test_limiter() -> RedisLoginRateLimiter {
    create_test_limiter_with_policy(LoginRateLimitPolicy::default()).await
}

fn random_identity() -> String {
    format!("user{}@example.com", rand::random::<u32>())
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_locks_after_five_failures() {
    let limiter = create_test_limiter().await;
    let identity = random_identity();

    for i in 1..=4 {
        limiter.check_login_attempt(&identity).await.unwrap();
        let status = limiter.record_failed_attempt(&identity).await.unwrap();
        assert_eq!(status.failed_attempts, i);
        assert!(!status.is_locked(), "Failure {} should not lock", i);
    }

    limiter.check_login_attempt(&identity).await.unwrap();
    let status = limiter.record_failed_attempt(&identity).await.unwrap();
    assert!(status.is_locked());

    match limiter.check_login_attempt(&identity).await {
        Err(AuthError::TooManyAttempts { retry_after_seconds }) => {
            assert!(retry_after_seconds > 890 && retry_after_seconds <= 900);
        }
        other => panic!("Expected lockout, got {:?}", other),
    }

    limiter.reset_attempts(&identity).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_success_resets_counter() {
    let limiter = create_test_limiter().await;
    let identity = random_identity();

    for _ in 0..4 {
        limiter.check_login_attempt(&identity).await.unwrap();
        limiter.record_failed_attempt(&identity).await.unwrap();
    }
    limiter.check_login_attempt(&identity).await.unwrap();
    limiter.reset_attempts(&identity).await.unwrap();

    limiter.check_login_attempt(&identity).await.unwrap();
    let status = limiter.record_failed_attempt(&identity).await.unwrap();
    assert_eq!(status.failed_attempts, 1);

    limiter.reset_attempts(&identity).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_lock_expires_after_cooldown() {
    let policy = LoginRateLimitPolicy {
        max_failed_attempts: 2,
        window: Duration::seconds(30),
        lockout: Duration::seconds(1),
    };
    let limiter = create_test_limiter_with_policy(policy).await;
    let identity = random_identity();

    for _ in 0..2 {
        limiter.check_login_attempt(&identity).await.unwrap();
        limiter.record_failed_attempt(&identity).await.unwrap();
    }
    assert!(limiter.check_login_attempt(&identity).await.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    assert!(limiter.check_login_attempt(&identity).await.is_ok());

    limiter.reset_attempts(&identity).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis to be running
async fn test_concurrent_burst_admits_threshold() {
    let limiter = Arc::new(create_test_limiter().await);
    let identity = random_identity();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let limiter = Arc::clone(&limiter);
        let identity = identity.clone();
        handles.push(tokio::spawn(async move { limiter.check_login_attempt(&identity).await }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 5);

    limiter.release_attempt(&identity).await.unwrap();
    assert!(limiter.check_login_attempt(&identity).await.is_ok());

    limiter.reset_attempts(&identity).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_locked_until_uses_clock() {
    let clock = Arc::new(ManualClock::starting_now());
    let config = CacheConfig::new(
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
    )
    .with_prefix("tollgate_test");
    let limiter = RedisLoginRateLimiter::new(
        Arc::new(RedisClient::new(config).await.unwrap()),
        LoginRateLimitPolicy {
            max_failed_attempts: 1,
            ..LoginRateLimitPolicy::default()
        },
        "login_attempts",
        clock.clone(),
    );
    let identity = random_identity();

    limiter.check_login_attempt(&identity).await.unwrap();
    let status = limiter.record_failed_attempt(&identity).await.unwrap();
    assert_eq!(status.locked_until, Some(clock.now() + Duration::seconds(900)));

    limiter.reset_attempts(&identity).await.unwrap();
}
