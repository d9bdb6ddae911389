//! Refresh-token session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ClientFingerprint;

/// One issued refresh-token grant.
///
/// Rows are never deleted by the core. `refresh_token_hash` is fixed at
/// creation; rotation writes a new row and marks this one revoked and
/// rotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// SHA-256 hex of the raw refresh token
    pub refresh_token_hash: String,
    /// Shared by every session descending from one login
    pub family_id: Uuid,
    /// Session this one was rotated from
    pub parent_session_id: Option<Uuid>,
    pub ip_address: String,
    pub user_agent: String,
    pub device_info: Option<String>,
    pub last_ip: Option<String>,
    pub last_user_agent: Option<String>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub refresh_count: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub was_rotated: bool,
}

/// Derived lifecycle state of a session row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    /// Superseded by a child session
    Rotated,
    /// Revoked by logout, deactivation or reuse cascade
    Revoked,
}

impl Session {
    /// Creates the first session of a new family
    pub fn new(
        user_id: Uuid,
        refresh_token_hash: String,
        fingerprint: &ClientFingerprint,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_token_hash,
            family_id: Uuid::new_v4(),
            parent_session_id: None,
            ip_address: fingerprint.ip_address.clone(),
            user_agent: fingerprint.user_agent.clone(),
            device_info: fingerprint.device_info.clone(),
            last_ip: None,
            last_user_agent: None,
            last_used_at: None,
            refresh_count: 0,
            created_at,
            expires_at,
            revoked_at: None,
            rotated_at: None,
            was_rotated: false,
        }
    }

    /// Builds the child session that supersedes `self` on rotation
    pub fn successor(
        &self,
        refresh_token_hash: String,
        fingerprint: &ClientFingerprint,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            family_id: self.family_id,
            parent_session_id: Some(self.id),
            device_info: fingerprint
                .device_info
                .clone()
                .or_else(|| self.device_info.clone()),
            ..Self::new(self.user_id, refresh_token_hash, fingerprint, created_at, expires_at)
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.revoked_at, self.was_rotated) {
            (None, _) => SessionState::Active,
            (Some(_), true) => SessionState::Rotated,
            (Some(_), false) => SessionState::Revoked,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Usable for a refresh at `now`, ignoring the owner's status
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired(now)
    }

    /// Last successful use, or creation when never refreshed
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_used_at.unwrap_or(self.created_at)
    }

    /// Fingerprint recorded at the most recent successful use
    pub fn baseline_fingerprint(&self) -> (&str, &str) {
        (
            self.last_ip.as_deref().unwrap_or(&self.ip_address),
            self.last_user_agent.as_deref().unwrap_or(&self.user_agent),
        )
    }

    pub fn revoke(&mut self, at: DateTime<Utc>) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(at);
        }
    }

    pub fn mark_rotated(&mut self, at: DateTime<Utc>) {
        self.revoke(at);
        self.rotated_at = Some(at);
        self.was_rotated = true;
    }

    /// Applies an in-place refresh
    pub fn apply(&mut self, update: &SessionMetadataUpdate) {
        self.last_used_at = Some(update.last_used_at);
        self.last_ip = Some(update.last_ip.clone());
        self.last_user_agent = Some(update.last_user_agent.clone());
        self.refresh_count = update.refresh_count;
    }
}

/// Fields written by an in-place refresh.
///
/// Stores apply it only while the session is unrevoked and its current
/// `refresh_count` equals `refresh_count - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadataUpdate {
    pub last_used_at: DateTime<Utc>,
    pub last_ip: String,
    pub last_user_agent: String,
    pub refresh_count: u32,
}

impl SessionMetadataUpdate {
    pub fn for_refresh(session: &Session, fingerprint: &ClientFingerprint, now: DateTime<Utc>) -> Self {
        Self {
            last_used_at: now,
            last_ip: fingerprint.ip_address.clone(),
            last_user_agent: fingerprint.user_agent.clone(),
            refresh_count: session.refresh_count + 1,
        }
    }

    pub fn expected_refresh_count(&self) -> u32 {
        self.refresh_count.saturating_sub(1)
    }
}
