//! End-to-end auth flow against MySQL
//!
//! Requires MySQL reachable through `DATABASE_URL`.
//! Run with: cargo test --test auth_flow_integration -- --ignored

use std::sync::Arc;

use uuid::Uuid;

use tg_core::clock::SystemClock;
use tg_core::domain::value_objects::ClientFingerprint;
use tg_core::errors::AuthError;
use tg_core::services::{BcryptPasswordVerifier, LogoutTarget};
use tg_infra::InfrastructureServices;
use tg_shared::config::{AppConfig, RateLimitBackend};

async fn connect() -> (InfrastructureServices, AppConfig) {
    let mut config = AppConfig::development();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }
    config.rate_limit.backend = RateLimitBackend::Memory;

    let services = InfrastructureServices::connect(&config)
        .await
        .expect("Failed to connect infrastructure");
    services.database().run_migrations().await.expect("Failed to run migrations");
    (services, config)
}

async fn seed_user(services: &InfrastructureServices, email: &str, password: &str) -> Uuid {
    let id = Uuid::new_v4();
    let hash = BcryptPasswordVerifier::hash(password, 4).await.unwrap();
    sqlx::query("INSERT INTO users (id, email, password_hash, role, is_active) VALUES (?, ?, ?, 'customer', TRUE)")
        .bind(id.to_string())
        .bind(email)
        .bind(hash)
        .execute(services.database().pool())
        .await
        .expect("Failed to seed user");
    id
}

#[tokio::test]
#[ignore] // Requires MySQL to be running
async fn test_login_refresh_logout() {
    let (services, config) = connect().await;
    let coordinator = services.auth_coordinator(&config, Arc::new(SystemClock)).unwrap();
    let email = format!("flow{}@example.com", rand::random::<u32>());
    let user_id = seed_user(&services, &email, "correct horse").await;
    let fingerprint = ClientFingerprint::new("198.51.100.4", "Mozilla/5.0 Firefox/121.0");

    let login = coordinator
        .login(&email.to_uppercase(), "correct horse", &fingerprint)
        .await
        .unwrap();
    assert_eq!(login.user.id, user_id);

    let claims = coordinator.validate_access_token(&login.access_token).unwrap();
    assert_eq!(claims.user_id(), Some(user_id));

    // The minimum interval between refreshes has not elapsed yet.
    assert!(matches!(
        coordinator.refresh(&login.refresh_token, &fingerprint).await,
        Err(AuthError::RefreshTooSoon { .. })
    ));

    let sessions = coordinator.list_sessions(user_id, Some(&login.refresh_token)).await.unwrap();
    assert_eq!(sessions.len(), 1);

    assert_eq!(coordinator.logout(LogoutTarget::RefreshToken(login.refresh_token.clone())).await, Ok(1));
    assert_eq!(
        coordinator.refresh(&login.refresh_token, &fingerprint).await,
        Err(AuthError::SessionRevoked)
    );
    assert_eq!(coordinator.recent_activity(user_id, 10).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore] // Requires MySQL to be running
async fn test_wrong_password_is_invalid_credentials() {
    let (services, config) = connect().await;
    let coordinator = services.auth_coordinator(&config, Arc::new(SystemClock)).unwrap();
    let email = format!("flow{}@example.com", rand::random::<u32>());
    seed_user(&services, &email, "correct horse").await;
    let fingerprint = ClientFingerprint::new("198.51.100.4", "curl/8.4.0");

    assert_eq!(
        coordinator.login(&email, "battery staple", &fingerprint).await.err(),
        Some(AuthError::InvalidCredentials)
    );
    assert_eq!(
        coordinator.login("nobody@example.com", "battery staple", &fingerprint).await.err(),
        Some(AuthError::InvalidCredentials)
    );
}
