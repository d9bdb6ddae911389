//! Authentication coordinator implementation

use std::future::Future;
use std::sync::Arc;

use tg_shared::config::AuthConfig;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::entities::{Session, SessionAction, SessionActivity, TokenClaims};
use crate::domain::value_objects::{
    ClientFingerprint, LoginResponse, RefreshCookie, RefreshResponse, SessionInfo, UserInfo, TOKEN_TYPE_BEARER,
};
use crate::errors::{AuthError, AuthResult, StoreError};
use crate::repositories::{NoOpSessionActivityRepository, SessionActivityRepository, SessionStore, UserLookup};
use crate::services::activity::{ActivityRecorder, ActivityRecorderConfig};
use crate::services::anomaly::{AnomalyDetector, AnomalyDetectorConfig};
use crate::services::password::PasswordVerifier;
use crate::services::rate_limit::{mask_identity, normalize_identity, AttemptReservation, LoginRateLimiter};
use crate::services::rotation::{RotationEngine, RotationPolicy};
use crate::services::storage::bounded;
use crate::services::token::{hash_token, TokenCodec, TokenCodecConfig};

use super::config::AuthCoordinatorConfig;

/// What a logout applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutTarget {
    /// The single session behind a raw refresh token
    RefreshToken(String),
    /// Every session of a user
    Principal(Uuid),
}

/// Entry point for credential issuance and session lifecycle
pub struct AuthCoordinator<U, S, L, P, A = NoOpSessionActivityRepository>
where
    U: UserLookup,
    S: SessionStore + 'static,
    L: LoginRateLimiter + 'static,
    P: PasswordVerifier,
    A: SessionActivityRepository + 'static,
{
    /// User directory
    users: Arc<U>,
    /// Session persistence
    sessions: Arc<S>,
    /// Failed login throttling
    limiter: Arc<L>,
    /// Password hash verification
    passwords: Arc<P>,
    /// Token signing and verification
    codec: Arc<TokenCodec>,
    /// Refresh state machine
    engine: RotationEngine<S, U, A>,
    /// Activity trail
    activity: Arc<ActivityRecorder<A>>,
    config: AuthCoordinatorConfig,
    clock: Arc<dyn Clock>,
}

impl<U, S, L, P, A> AuthCoordinator<U, S, L, P, A>
where
    U: UserLookup,
    S: SessionStore + 'static,
    L: LoginRateLimiter + 'static,
    P: PasswordVerifier,
    A: SessionActivityRepository + 'static,
{
    /// Create a new coordinator, building the codec and rotation engine
    /// from `config`
    ///
    /// # Arguments
    ///
    /// * `users` - User directory
    /// * `sessions` - Session persistence
    /// * `limiter` - Failed login throttling
    /// * `passwords` - Password verification
    /// * `activity` - Activity trail storage
    /// * `config` - Token, session policy and cookie settings
    /// * `clock` - Time source shared by every component
    pub fn new(
        users: Arc<U>,
        sessions: Arc<S>,
        limiter: Arc<L>,
        passwords: Arc<P>,
        activity: Arc<A>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(TokenCodecConfig::from(&config.jwt), Arc::clone(&clock)));
        let policy = RotationPolicy::from(&config.session);
        let activity = Arc::new(ActivityRecorder::new(
            activity,
            ActivityRecorderConfig {
                async_writes: false,
                write_timeout: policy.storage_timeout,
            },
        ));
        let engine = RotationEngine::new(
            Arc::clone(&sessions),
            Arc::clone(&users),
            Arc::clone(&codec),
            AnomalyDetector::new(AnomalyDetectorConfig::from(&config.session)),
            Arc::clone(&activity),
            policy,
            Arc::clone(&clock),
        );

        Self {
            users,
            sessions,
            limiter,
            passwords,
            codec,
            engine,
            activity,
            config: AuthCoordinatorConfig::from(config),
            clock,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate with email and password and open a new session
    ///
    /// This method:
    /// 1. Checks the login rate limit for the normalised email
    /// 2. Verifies the password, or a dummy hash when the email is unknown
    /// 3. Records a failure or resets the counter
    /// 4. Revokes other sessions when single-session policy is on
    /// 5. Issues the token pair and stores a session opening a new family
    ///
    /// # Returns
    ///
    /// * `Ok(LoginResponse)` - Access and refresh tokens with the user
    /// * `Err(AuthError::TooManyAttempts)` - Identity is locked
    /// * `Err(AuthError::InvalidCredentials)` - Unknown email or wrong password
    /// * `Err(AuthError::AccountInactive)` - Correct password, inactive account
    /// * `Err(AuthError::StorageUnavailable)` - A backend failed or timed out
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<LoginResponse> {
        let identity = normalize_identity(email);

        let reservation = match AttemptReservation::acquire(Arc::clone(&self.limiter), &identity).await {
            Ok(reservation) => reservation,
            Err(e) => {
                if let AuthError::TooManyAttempts { retry_after_seconds } = e {
                    info!(
                        identity = %mask_identity(&identity),
                        retry_after_seconds = retry_after_seconds,
                        "Login rejected by rate limiter"
                    );
                }
                return Err(e);
            }
        };

        let account = match self.within("find_user_by_email", self.users.find_by_email(&identity)).await {
            Ok(account) => account,
            Err(e) => {
                reservation.release().await;
                return Err(e.into());
            }
        };

        let verified = match &account {
            Some(account) => self.passwords.verify(password, &account.password_hash).await,
            None => {
                self.passwords.verify_dummy(password).await;
                false
            }
        };

        let account = match account {
            Some(account) if verified => account,
            _ => {
                let status = reservation.record_failure().await?;
                info!(
                    identity = %mask_identity(&identity),
                    failed_attempts = status.failed_attempts,
                    locked = status.is_locked(),
                    "Login failed"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        let principal = account.principal;
        if !principal.is_active {
            reservation.release().await;
            info!(user_id = %principal.id, "Login rejected for inactive account");
            return Err(AuthError::AccountInactive);
        }

        reservation.reset().await?;

        let now = self.clock.now();
        if self.config.single_session {
            let revoked = self
                .within("revoke_all_for_user", self.sessions.revoke_all_for_user(principal.id, now))
                .await?;
            if revoked > 0 {
                info!(user_id = %principal.id, revoked_sessions = revoked, "Revoked previous sessions on login");
            }
        }

        let access_token = self.codec.issue_access(&principal)?;
        let refresh_token = self.codec.issue_refresh(principal.id)?;
        let session = Session::new(
            principal.id,
            hash_token(&refresh_token.token),
            fingerprint,
            now,
            refresh_token.expires_at,
        );

        self.within("create_session", self.sessions.create(&session))
            .await?;

        self.activity
            .record(
                SessionActivity::new(session.id, principal.id, SessionAction::Login, now)
                    .with_fingerprint(fingerprint),
            )
            .await;

        info!(user_id = %principal.id, session_id = %session.id, "User logged in");

        Ok(LoginResponse {
            access_token: access_token.token,
            refresh_token: refresh_token.token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.codec.access_ttl_seconds(),
            session_id: session.id,
            user: UserInfo::from(&principal),
        })
    }

    /// Exchange a refresh token for a new access token, rotating the
    /// refresh token when policy says so
    pub async fn refresh(&self, refresh_token: &str, fingerprint: &ClientFingerprint) -> AuthResult<RefreshResponse> {
        let outcome = self.engine.refresh(refresh_token, fingerprint).await?;

        Ok(RefreshResponse {
            access_token: outcome.access_token.token,
            refresh_token: outcome.refresh_token.map(|issued| issued.token),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: outcome.expires_in,
            session_id: outcome.session_id,
            user: UserInfo::from(&outcome.principal),
        })
    }

    /// Revoke one session or every session of a user
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - Number of sessions revoked by this call
    /// * `Err(AuthError::InvalidRefreshToken)` - No session for the token
    /// * `Err(AuthError::SessionRevoked)` - The session was already revoked
    pub async fn logout(&self, target: LogoutTarget) -> AuthResult<u64> {
        match target {
            LogoutTarget::RefreshToken(token) => self.logout_session(&token).await.map(|_| 1),
            LogoutTarget::Principal(user_id) => self.logout_everywhere(user_id).await,
        }
    }

    /// Revoke every session of the principal an access token was issued to
    pub async fn logout_with_access_token(&self, access_token: &str) -> AuthResult<u64> {
        let claims = self.validate_access_token(access_token)?;
        let user_id = claims.user_id().ok_or(AuthError::InvalidToken)?;
        self.logout(LogoutTarget::Principal(user_id)).await
    }

    /// Verify an access token
    ///
    /// Stateless: a token stays valid until expiry even after logout.
    pub fn validate_access_token(&self, access_token: &str) -> AuthResult<TokenClaims> {
        self.codec.parse_access(access_token)
    }

    /// Active sessions of a principal, newest first
    ///
    /// `current_refresh_token` marks the caller's own session.
    pub async fn list_sessions(
        &self,
        principal_id: Uuid,
        current_refresh_token: Option<&str>,
    ) -> AuthResult<Vec<SessionInfo>> {
        let now = self.clock.now();
        let sessions = self
            .within("list_active_sessions", self.sessions.list_active_for_user(principal_id, now))
            .await?;
        let current_hash = current_refresh_token.map(hash_token);

        Ok(sessions
            .iter()
            .map(|session| {
                let is_current = current_hash.as_deref() == Some(session.refresh_token_hash.as_str());
                SessionInfo::from_session(session, is_current)
            })
            .collect())
    }

    /// Recent session activity of a principal, newest first
    pub async fn recent_activity(&self, principal_id: Uuid, limit: usize) -> AuthResult<Vec<SessionActivity>> {
        Ok(self.activity.recent_for_user(principal_id, limit).await?)
    }

    /// Cookie carrying a freshly issued refresh token
    pub fn refresh_cookie(&self, refresh_token: &str) -> RefreshCookie {
        RefreshCookie::new(&self.config.cookie, refresh_token, self.codec.refresh_ttl_seconds())
    }

    /// Cookie that removes the refresh token from the client
    pub fn clear_refresh_cookie(&self) -> RefreshCookie {
        RefreshCookie::cleared(&self.config.cookie)
    }

    async fn logout_session(&self, refresh_token: &str) -> AuthResult<()> {
        let token_hash = hash_token(refresh_token);
        let session = match self
            .within("find_session_by_token_hash", self.sessions.find_by_token_hash(&token_hash))
            .await
        {
            Ok(session) => session,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidRefreshToken),
            Err(e) => return Err(e.into()),
        };

        if session.is_revoked() {
            debug!(session_id = %session.id, "Logout for an already revoked session");
            return Err(AuthError::SessionRevoked);
        }

        let now = self.clock.now();
        let revoked = self
            .within("revoke_session", self.sessions.revoke(session.id, now))
            .await?;
        if !revoked {
            return Err(AuthError::SessionRevoked);
        }

        self.activity
            .record(SessionActivity::new(session.id, session.user_id, SessionAction::Logout, now))
            .await;

        info!(user_id = %session.user_id, session_id = %session.id, "Session logged out");
        Ok(())
    }

    async fn logout_everywhere(&self, user_id: Uuid) -> AuthResult<u64> {
        let now = self.clock.now();
        let revoked = self
            .within("revoke_all_for_user", self.sessions.revoke_all_for_user(user_id, now))
            .await?;

        info!(user_id = %user_id, revoked_sessions = revoked, "User logged out of all sessions");
        Ok(revoked)
    }

    async fn within<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        bounded(self.config.storage_timeout, operation, call).await
    }
}
