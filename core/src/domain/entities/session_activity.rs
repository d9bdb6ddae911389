//! Append-only audit trail of session lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ClientFingerprint;

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Login,
    Refresh,
    Rotate,
    Logout,
    Revoke,
    ReuseDetected,
    Anomaly,
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Login => "login",
            SessionAction::Refresh => "refresh",
            SessionAction::Rotate => "rotate",
            SessionAction::Logout => "logout",
            SessionAction::Revoke => "revoke",
            SessionAction::ReuseDetected => "reuse_detected",
            SessionAction::Anomaly => "anomaly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "login" => Some(SessionAction::Login),
            "refresh" => Some(SessionAction::Refresh),
            "rotate" => Some(SessionAction::Rotate),
            "logout" => Some(SessionAction::Logout),
            "revoke" => Some(SessionAction::Revoke),
            "reuse_detected" => Some(SessionAction::ReuseDetected),
            "anomaly" => Some(SessionAction::Anomaly),
            _ => None,
        }
    }
}

/// One audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionActivity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub action: SessionAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl SessionActivity {
    pub fn new(session_id: Uuid, user_id: Uuid, action: SessionAction, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            user_id,
            action,
            ip_address: None,
            user_agent: None,
            metadata: None,
            created_at,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: &ClientFingerprint) -> Self {
        self.ip_address = Some(fingerprint.ip_address.clone());
        self.user_agent = Some(fingerprint.user_agent.clone());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
