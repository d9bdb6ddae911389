//! Error kinds surfaced by the authentication core.
//!
//! [`AuthError`] is the closed set of outcomes the request layer switches
//! on. Messages never say which of "unknown user", "wrong password",
//! "unknown token" or "malformed token" happened.
//!
//! [`StoreError`] is what persistence adapters return; services map it to
//! [`AuthError`] explicitly at each call site.

use thiserror::Error;
use tg_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};

/// Authentication failures returned to the request layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many failed login attempts, retry in {retry_after_seconds}s")]
    TooManyAttempts { retry_after_seconds: u64 },

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Session revoked")]
    SessionRevoked,

    #[error("Refresh token reused")]
    RefreshTokenReused,

    #[error("Refresh requested too soon, retry in {retry_after_seconds}s")]
    RefreshTooSoon { retry_after_seconds: u64 },

    #[error("User deactivated")]
    UserDeactivated,

    #[error("Storage unavailable")]
    StorageUnavailable,

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => error_codes::INVALID_CREDENTIALS,
            AuthError::TooManyAttempts { .. } => error_codes::TOO_MANY_ATTEMPTS,
            AuthError::AccountInactive => error_codes::ACCOUNT_INACTIVE,
            AuthError::InvalidToken => error_codes::INVALID_TOKEN,
            AuthError::InvalidRefreshToken => error_codes::INVALID_REFRESH_TOKEN,
            AuthError::RefreshTokenExpired => error_codes::REFRESH_TOKEN_EXPIRED,
            AuthError::SessionRevoked => error_codes::SESSION_REVOKED,
            AuthError::RefreshTokenReused => error_codes::REFRESH_TOKEN_REUSED,
            AuthError::RefreshTooSoon { .. } => error_codes::REFRESH_TOO_SOON,
            AuthError::UserDeactivated => error_codes::USER_DEACTIVATED,
            AuthError::StorageUnavailable => error_codes::STORAGE_UNAVAILABLE,
            AuthError::Internal => error_codes::INTERNAL_ERROR,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::StorageUnavailable)
    }

    /// Seconds the caller should wait before retrying, when known
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AuthError::TooManyAttempts { retry_after_seconds }
            | AuthError::RefreshTooSoon { retry_after_seconds } => Some(*retry_after_seconds),
            _ => None,
        }
    }
}

impl IntoErrorResponse for AuthError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string());
        match self.retry_after() {
            Some(seconds) => response.add_detail("retry_after", seconds),
            None => response,
        }
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(error: AuthError) -> Self {
        error.to_error_response()
    }
}

/// Failures reported by persistence adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// A conditional write found the row in a different state
    #[error("Conflicting concurrent update")]
    Conflict,

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage call timed out")]
    Timeout,
}

/// Unavailability maps to the transient kind. `NotFound` and `Conflict` carry
/// meaning only at specific call sites, which match on them before falling
/// back to this conversion.
impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(_) | StoreError::Timeout => AuthError::StorageUnavailable,
            StoreError::NotFound | StoreError::Conflict => AuthError::Internal,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
