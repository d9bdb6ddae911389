//! End-to-end session lifecycle through the public API

use std::sync::Arc;

use chrono::Duration;
use tg_core::{
    AuthCoordinator, AuthError, BcryptPasswordVerifier, ClientFingerprint, Clock, InMemoryLoginRateLimiter,
    InMemorySessionActivityRepository, InMemorySessionStore, InMemoryUserDirectory, LoginRateLimitPolicy,
    LogoutTarget, ManualClock, Principal, Role, SessionState, SessionStore,
};
use tg_core::services::token::hash_token;
use tg_shared::config::AuthConfig;
use uuid::Uuid;

const EMAIL: &str = "dana@example.com";
const PASSWORD: &str = "s3cret-passphrase";

type Coordinator = AuthCoordinator<
    InMemoryUserDirectory,
    InMemorySessionStore,
    InMemoryLoginRateLimiter,
    BcryptPasswordVerifier,
    InMemorySessionActivityRepository,
>;

struct World {
    auth: Arc<Coordinator>,
    sessions: Arc<InMemorySessionStore>,
    clock: Arc<ManualClock>,
    principal: Principal,
}

async fn world(configure: impl FnOnce(&mut AuthConfig)) -> World {
    let mut config = AuthConfig::default();
    config.jwt.access_secret = "lifecycle-secret".to_string();
    configure(&mut config);

    let clock = Arc::new(ManualClock::starting_now());
    let users = Arc::new(InMemoryUserDirectory::new());
    let principal = Principal::new(Uuid::new_v4(), EMAIL, Role::Admin);
    let hash = BcryptPasswordVerifier::hash(PASSWORD, 4).await.unwrap();
    users.insert(principal.clone(), hash).await;

    let sessions = Arc::new(InMemorySessionStore::new());
    let auth = AuthCoordinator::new(
        users,
        sessions.clone(),
        Arc::new(InMemoryLoginRateLimiter::new(LoginRateLimitPolicy::default(), clock.clone())),
        Arc::new(BcryptPasswordVerifier::new(4).unwrap()),
        Arc::new(InMemorySessionActivityRepository::new()),
        &config,
        clock.clone(),
    );

    World {
        auth: Arc::new(auth),
        sessions,
        clock,
        principal,
    }
}

fn laptop() -> ClientFingerprint {
    ClientFingerprint::new("10.20.30.40", "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) Firefox/121.0")
        .with_device_info("work laptop")
}

#[tokio::test]
async fn test_login_claims_round_trip() {
    let w = world(|_| {}).await;
    let login = w.auth.login(EMAIL, PASSWORD, &laptop()).await.unwrap();

    let claims = w.auth.validate_access_token(&login.access_token).unwrap();
    assert_eq!(claims.user_id(), Some(w.principal.id));
    assert_eq!(claims.email, EMAIL);
    assert!(claims.is_admin);
    assert_eq!(claims.expires_at(), Some(w.clock.now() + Duration::minutes(15)));

    assert_eq!(w.auth.validate_access_token("garbage").unwrap_err(), AuthError::InvalidToken);
}

#[tokio::test]
async fn test_refresh_too_soon_then_success() {
    let w = world(|_| {}).await;
    let login = w.auth.login(EMAIL, PASSWORD, &laptop()).await.unwrap();
    let first_expiry = w.auth.validate_access_token(&login.access_token).unwrap().exp;

    let early = w.auth.refresh(&login.refresh_token, &laptop()).await;
    assert!(matches!(early.unwrap_err(), AuthError::RefreshTooSoon { .. }));

    w.clock.advance(Duration::seconds(30));
    let refreshed = w.auth.refresh(&login.refresh_token, &laptop()).await.unwrap();
    assert!(!refreshed.rotated());
    let second_expiry = w.auth.validate_access_token(&refreshed.access_token).unwrap().exp;
    assert!(second_expiry > first_expiry);
}

#[tokio::test]
async fn test_rotation_after_a_day() {
    let w = world(|_| {}).await;
    let login = w.auth.login(EMAIL, PASSWORD, &laptop()).await.unwrap();

    w.clock.advance(Duration::hours(25));
    let refreshed = w.auth.refresh(&login.refresh_token, &laptop()).await.unwrap();
    let new_token = refreshed.refresh_token.clone().unwrap();

    let old = w.sessions.find_by_id(login.session_id).await.unwrap();
    assert_eq!(old.state(), SessionState::Rotated);
    assert!(old.was_rotated);

    let child = w.sessions.find_by_token_hash(&hash_token(&new_token)).await.unwrap();
    assert_eq!(child.family_id, old.family_id);
    assert_eq!(child.parent_session_id, Some(old.id));
    assert_eq!(child.device_info.as_deref(), Some("work laptop"));
}

#[tokio::test]
async fn test_reuse_law() {
    let w = world(|c| c.session.always_rotate = true).await;
    let login = w.auth.login(EMAIL, PASSWORD, &laptop()).await.unwrap();

    let mut current = login.refresh_token.clone();
    for _ in 0..3 {
        w.clock.advance(Duration::seconds(11));
        current = w.auth.refresh(&current, &laptop()).await.unwrap().refresh_token.unwrap();
    }

    let replay = w.auth.refresh(&login.refresh_token, &laptop()).await;
    assert_eq!(replay.unwrap_err(), AuthError::RefreshTokenReused);

    w.clock.advance(Duration::seconds(11));
    let newest = w.auth.refresh(&current, &laptop()).await;
    assert!(newest.is_err());
    assert!(w.auth.list_sessions(w.principal.id, None).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_never_both_succeed() {
    let w = world(|c| c.session.always_rotate = true).await;
    let login = w.auth.login(EMAIL, PASSWORD, &laptop()).await.unwrap();
    w.clock.advance(Duration::seconds(11));

    let a = {
        let auth = w.auth.clone();
        let token = login.refresh_token.clone();
        tokio::spawn(async move { auth.refresh(&token, &laptop()).await })
    };
    let b = {
        let auth = w.auth.clone();
        let token = login.refresh_token.clone();
        tokio::spawn(async move { auth.refresh(&token, &laptop()).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AuthError::RefreshTokenReused))));
}

#[tokio::test]
async fn test_rate_limit_blocks_correct_password() {
    let w = world(|_| {}).await;
    for _ in 0..5 {
        let result = w.auth.login(EMAIL, "wrong-password", &laptop()).await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    let sixth = w.auth.login(EMAIL, PASSWORD, &laptop()).await;
    assert!(matches!(sixth.unwrap_err(), AuthError::TooManyAttempts { .. }));
}

#[tokio::test]
async fn test_logout_twice_reports_revoked() {
    let w = world(|_| {}).await;
    let login = w.auth.login(EMAIL, PASSWORD, &laptop()).await.unwrap();
    let target = LogoutTarget::RefreshToken(login.refresh_token.clone());

    assert_eq!(w.auth.logout(target.clone()).await, Ok(1));
    assert_eq!(w.auth.logout(target).await, Err(AuthError::SessionRevoked));
}
