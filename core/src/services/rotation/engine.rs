//! Refresh state machine

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tg_shared::config::ReuseRevocationScope;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::entities::{
    IssuedToken, Principal, Session, SessionAction, SessionActivity, SessionMetadataUpdate, SessionState,
};
use crate::domain::value_objects::ClientFingerprint;
use crate::errors::{AuthError, AuthResult, StoreError};
use crate::repositories::{NoOpSessionActivityRepository, SessionActivityRepository, SessionStore, UserLookup};
use crate::services::activity::ActivityRecorder;
use crate::services::anomaly::{AnomalyDetector, AnomalyReport};
use crate::services::storage::bounded;
use crate::services::token::{hash_token, TokenCodec};

use super::policy::RotationPolicy;

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: IssuedToken,
    /// Present only when the session was rotated
    pub refresh_token: Option<IssuedToken>,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// The session now backing the client, the new child after rotation
    pub session_id: Uuid,
    /// Owner snapshot the access token was issued for
    pub principal: Principal,
    pub anomaly: AnomalyReport,
}

impl RefreshOutcome {
    pub fn rotated(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Validates refresh tokens and advances their sessions
///
/// Checks run in a fixed order: revocation and reuse, expiry, owner status,
/// refresh interval. Only then is the anomaly check made and a token issued.
pub struct RotationEngine<S, U, A = NoOpSessionActivityRepository>
where
    S: SessionStore + 'static,
    U: UserLookup,
    A: SessionActivityRepository + 'static,
{
    sessions: Arc<S>,
    users: Arc<U>,
    codec: Arc<TokenCodec>,
    detector: AnomalyDetector,
    activity: Arc<ActivityRecorder<A>>,
    policy: RotationPolicy,
    clock: Arc<dyn Clock>,
}

impl<S, U, A> RotationEngine<S, U, A>
where
    S: SessionStore + 'static,
    U: UserLookup,
    A: SessionActivityRepository + 'static,
{
    /// Create a new rotation engine
    ///
    /// # Arguments
    ///
    /// * `sessions` - Session persistence
    /// * `users` - Owner lookup, consulted on every refresh
    /// * `codec` - Token signing and verification
    /// * `detector` - Fingerprint comparison
    /// * `activity` - Activity trail
    /// * `policy` - Rotation thresholds
    /// * `clock` - Time source
    pub fn new(
        sessions: Arc<S>,
        users: Arc<U>,
        codec: Arc<TokenCodec>,
        detector: AnomalyDetector,
        activity: Arc<ActivityRecorder<A>>,
        policy: RotationPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            users,
            codec,
            detector,
            activity,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Exchange a refresh token for a new access token
    ///
    /// # Returns
    ///
    /// * `Ok(RefreshOutcome)` - New access token, plus a new refresh token
    ///   when the session was rotated
    /// * `Err(AuthError::InvalidRefreshToken)` - Token unverifiable, unknown,
    ///   or its owner no longer exists
    /// * `Err(AuthError::SessionRevoked)` - Session was logged out or revoked
    /// * `Err(AuthError::RefreshTokenReused)` - Token was already rotated; the
    ///   family (or every session of the user) is now revoked
    /// * `Err(AuthError::RefreshTokenExpired)` - Session past its expiry
    /// * `Err(AuthError::UserDeactivated)` - Owner deactivated; all of their
    ///   sessions are now revoked
    /// * `Err(AuthError::RefreshTooSoon)` - Within the minimum interval
    /// * `Err(AuthError::StorageUnavailable)` - A storage call failed or timed out
    pub async fn refresh(&self, raw_token: &str, fingerprint: &ClientFingerprint) -> AuthResult<RefreshOutcome> {
        let token = self
            .codec
            .parse_refresh(raw_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let token_hash = hash_token(raw_token);
        let session = match self
            .within("find_session_by_token_hash", self.sessions.find_by_token_hash(&token_hash))
            .await
        {
            Ok(session) => session,
            Err(StoreError::NotFound) => {
                debug!(user_id = %token.subject, "Refresh token has no session");
                return Err(AuthError::InvalidRefreshToken);
            }
            Err(e) => return Err(e.into()),
        };

        if session.user_id != token.subject {
            warn!(session_id = %session.id, "Refresh token subject does not match its session");
            return Err(AuthError::InvalidRefreshToken);
        }

        self.check_revocation(&session, fingerprint).await?;

        let now = self.clock.now();
        if session.is_expired(now) {
            debug!(session_id = %session.id, "Refresh token session expired");
            return Err(AuthError::RefreshTokenExpired);
        }

        let principal = self.load_owner(&session, fingerprint, now).await?;

        if let Some(retry_after_seconds) = self.policy.too_soon(&session, now) {
            return Err(AuthError::RefreshTooSoon { retry_after_seconds });
        }

        let anomaly = self.detector.assess(&session, fingerprint);
        if anomaly.is_anomalous() {
            self.flag_anomaly(&session, fingerprint, anomaly, now).await?;
        }

        let access_token = self.codec.issue_access(&principal)?;

        let (session_id, refresh_token, action) = if self.policy.should_rotate(&session, now) {
            let (child_id, refresh_token) = self.rotate(&session, fingerprint, now).await?;
            (child_id, Some(refresh_token), SessionAction::Rotate)
        } else {
            self.update_in_place(&session, fingerprint, now).await?;
            (session.id, None, SessionAction::Refresh)
        };

        self.activity
            .record(
                SessionActivity::new(session_id, session.user_id, action, now)
                    .with_fingerprint(fingerprint)
                    .with_metadata(json!({
                        "previous_session_id": session.id,
                        "refresh_count": session.refresh_count,
                    })),
            )
            .await;

        info!(
            user_id = %session.user_id,
            session_id = %session_id,
            rotated = refresh_token.is_some(),
            "Session refreshed"
        );

        Ok(RefreshOutcome {
            access_token,
            refresh_token,
            expires_in: self.codec.access_ttl_seconds(),
            session_id,
            principal,
            anomaly,
        })
    }

    /// Classify a session that is no longer active
    ///
    /// A revoked row fails with `SessionRevoked`. A rotated row means its
    /// token was replayed, so the cascade runs before `RefreshTokenReused`
    /// is returned.
    async fn check_revocation(&self, session: &Session, fingerprint: &ClientFingerprint) -> AuthResult<()> {
        match session.state() {
            SessionState::Active => Ok(()),
            SessionState::Revoked => {
                debug!(session_id = %session.id, "Refresh presented for a revoked session");
                Err(AuthError::SessionRevoked)
            }
            SessionState::Rotated => {
                self.cascade_reuse(session, fingerprint).await?;
                Err(AuthError::RefreshTokenReused)
            }
        }
    }

    async fn cascade_reuse(&self, session: &Session, fingerprint: &ClientFingerprint) -> AuthResult<u64> {
        let now = self.clock.now();
        let sessions = Arc::clone(&self.sessions);
        let limit = self.policy.storage_timeout;
        let scope = self.policy.reuse_scope;
        let (family_id, user_id) = (session.family_id, session.user_id);

        // Spawned so the revocation completes even if the request is dropped
        let cascade = tokio::spawn(async move {
            match scope {
                ReuseRevocationScope::Family => {
                    bounded(limit, "revoke_family", sessions.revoke_family(family_id, now)).await
                }
                ReuseRevocationScope::User => {
                    bounded(limit, "revoke_all_for_user", sessions.revoke_all_for_user(user_id, now)).await
                }
            }
        });

        let revoked = match cascade.await {
            Ok(Ok(revoked)) => revoked,
            Ok(Err(e)) => {
                error!(error = %e, session_id = %session.id, "Failed to revoke sessions after refresh token reuse");
                return Err(AuthError::StorageUnavailable);
            }
            Err(e) => {
                error!(error = %e, session_id = %session.id, "Reuse revocation task failed");
                return Err(AuthError::StorageUnavailable);
            }
        };

        warn!(
            user_id = %user_id,
            session_id = %session.id,
            family_id = %family_id,
            scope = ?scope,
            revoked_sessions = revoked,
            "Refresh token reuse detected"
        );

        self.activity
            .record(
                SessionActivity::new(session.id, user_id, SessionAction::ReuseDetected, now)
                    .with_fingerprint(fingerprint)
                    .with_metadata(json!({
                        "family_id": family_id,
                        "scope": scope,
                        "revoked_sessions": revoked,
                    })),
            )
            .await;

        Ok(revoked)
    }

    /// Current owner of the session, revoking everything the owner holds if
    /// they are gone or deactivated
    async fn load_owner(
        &self,
        session: &Session,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> AuthResult<Principal> {
        let owner = self
            .within("find_user_by_id", self.users.find_by_id(session.user_id))
            .await?;

        let (reason, failure) = match owner {
            Some(principal) if principal.is_active => return Ok(principal),
            Some(_) => ("user_deactivated", AuthError::UserDeactivated),
            None => ("user_missing", AuthError::InvalidRefreshToken),
        };

        let revoked = self
            .within("revoke_all_for_user", self.sessions.revoke_all_for_user(session.user_id, now))
            .await?;

        warn!(
            user_id = %session.user_id,
            reason = reason,
            revoked_sessions = revoked,
            "Refresh rejected for unavailable owner, sessions revoked"
        );

        self.activity
            .record(
                SessionActivity::new(session.id, session.user_id, SessionAction::Revoke, now)
                    .with_fingerprint(fingerprint)
                    .with_metadata(json!({ "reason": reason, "revoked_sessions": revoked })),
            )
            .await;

        Err(failure)
    }

    async fn flag_anomaly(
        &self,
        session: &Session,
        fingerprint: &ClientFingerprint,
        report: AnomalyReport,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        warn!(
            user_id = %session.user_id,
            session_id = %session.id,
            ip_changed = report.ip_changed,
            user_agent_changed = report.user_agent_changed,
            "Anomalous refresh detected"
        );

        self.activity
            .record(
                SessionActivity::new(session.id, session.user_id, SessionAction::Anomaly, now)
                    .with_fingerprint(fingerprint)
                    .with_metadata(json!(report)),
            )
            .await;

        if !self.policy.revoke_on_anomaly {
            return Ok(());
        }

        self.within("revoke_session", self.sessions.revoke(session.id, now))
            .await?;

        self.activity
            .record(
                SessionActivity::new(session.id, session.user_id, SessionAction::Revoke, now)
                    .with_fingerprint(fingerprint)
                    .with_metadata(json!({ "reason": "anomaly" })),
            )
            .await;

        Err(AuthError::SessionRevoked)
    }

    /// Supersede `session` with a child carrying a new refresh token
    async fn rotate(
        &self,
        session: &Session,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> AuthResult<(Uuid, IssuedToken)> {
        let refresh_token = self.codec.issue_refresh(session.user_id)?;
        let child = session.successor(hash_token(&refresh_token.token), fingerprint, now, refresh_token.expires_at);

        match self
            .within("rotate_atomically", self.sessions.rotate_atomically(session.id, &child, now))
            .await
        {
            Ok(()) => {
                debug!(session_id = %session.id, child_session_id = %child.id, "Session rotated");
                Ok((child.id, refresh_token))
            }
            Err(StoreError::Conflict) => {
                let current = self
                    .within("find_session_by_id", self.sessions.find_by_id(session.id))
                    .await?;
                self.check_revocation(&current, fingerprint).await?;
                error!(session_id = %session.id, "Rotation conflict on a session that is still active");
                Err(AuthError::Internal)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record the refresh on the existing row
    async fn update_in_place(
        &self,
        session: &Session,
        fingerprint: &ClientFingerprint,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let update = SessionMetadataUpdate::for_refresh(session, fingerprint, now);

        match self
            .within("update_session_metadata", self.sessions.update_metadata(session.id, &update))
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict) => {
                // A concurrent refresh of the same token got there first
                let current = self
                    .within("find_session_by_id", self.sessions.find_by_id(session.id))
                    .await?;
                self.check_revocation(&current, fingerprint).await?;
                Err(AuthError::RefreshTooSoon {
                    retry_after_seconds: self.policy.too_soon(&current, now).unwrap_or(1),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn within<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        bounded(self.policy.storage_timeout, operation, call).await
    }
}
