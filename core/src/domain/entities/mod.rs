//! Domain entities representing core authentication objects.

pub mod login_attempt;
pub mod principal;
pub mod session;
pub mod session_activity;
pub mod token;

// Re-export commonly used types
pub use login_attempt::LoginAttemptCounter;
pub use principal::{Principal, Role, UserAccount};
pub use session::{Session, SessionMetadataUpdate, SessionState};
pub use session_activity::{SessionAction, SessionActivity};
pub use token::{IssuedToken, RefreshClaims, RefreshTokenInfo, TokenClaims};
