//! JWT payloads for access and refresh tokens.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::principal::{Principal, Role};

/// Claims carried by an access token
///
/// `is_admin` is derived from the role when the token is issued and is not
/// re-checked against the user directory until the next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    pub role: Role,

    pub is_admin: bool,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// JWT ID, unique per token
    pub jti: String,
}

impl TokenClaims {
    /// Creates access token claims for a principal
    ///
    /// # Arguments
    ///
    /// * `principal` - The user the token is issued to
    /// * `issuer` - Value of the `iss` claim
    /// * `now` - Issuance instant
    /// * `ttl` - Lifetime of the token
    pub fn for_principal(principal: &Principal, issuer: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            is_admin: principal.is_admin(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Parses the subject as a user id
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Claims carried by a refresh token
///
/// Deliberately minimal: everything else about the grant lives in the
/// session row found through the token hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub jti: String,
}

impl RefreshClaims {
    pub fn for_user(user_id: Uuid, issuer: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Structural content of a verified refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenInfo {
    pub subject: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
