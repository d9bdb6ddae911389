//! Value objects exchanged with the request layer.

pub mod auth_response;
pub mod fingerprint;
pub mod refresh_cookie;

// Re-export commonly used types
pub use auth_response::{LoginResponse, RefreshResponse, SessionInfo, UserInfo, TOKEN_TYPE_BEARER};
pub use fingerprint::ClientFingerprint;
pub use refresh_cookie::RefreshCookie;
