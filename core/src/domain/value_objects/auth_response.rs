//! Authentication responses returned to the request layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Principal, Role, Session};

/// Value of `token_type` in every token response
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Public view of the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<&Principal> for UserInfo {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
        }
    }
}

/// Result of a successful login
///
/// The refresh token is meant for an HTTP-only cookie (see
/// [`RefreshCookie`](super::RefreshCookie)); it is skipped when serializing
/// so it never ends up in a JSON body by accident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    #[serde(skip_serializing, default)]
    pub refresh_token: String,

    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    pub session_id: Uuid,

    pub user: UserInfo,
}

/// Result of a successful refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshResponse {
    pub access_token: String,

    /// Present only when the refresh token was rotated
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,

    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Session the caller should present next time
    pub session_id: Uuid,

    /// User snapshot taken during this refresh
    pub user: UserInfo,
}

impl RefreshResponse {
    pub fn rotated(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// One active session as listed to its owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub device_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    /// True for the session the request was made with
    pub is_current: bool,
}

impl SessionInfo {
    pub fn from_session(session: &Session, is_current: bool) -> Self {
        Self {
            id: session.id,
            ip_address: session.last_ip.clone().unwrap_or_else(|| session.ip_address.clone()),
            user_agent: session
                .last_user_agent
                .clone()
                .unwrap_or_else(|| session.user_agent.clone()),
            device_info: session.device_info.clone(),
            created_at: session.created_at,
            last_used_at: session.last_used_at,
            expires_at: session.expires_at,
            is_current,
        }
    }
}
