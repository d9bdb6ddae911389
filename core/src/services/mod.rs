//! Business services containing the authentication and session logic.

pub mod activity;
pub mod anomaly;
pub mod auth;
pub mod password;
pub mod rate_limit;
pub mod rotation;
pub mod token;

pub(crate) mod storage;

// Re-export commonly used types
pub use activity::{ActivityRecorder, ActivityRecorderConfig};
pub use anomaly::{AnomalyDetector, AnomalyDetectorConfig, AnomalyReport};
pub use auth::{AuthCoordinator, AuthCoordinatorConfig, LogoutTarget};
pub use password::{BcryptPasswordVerifier, PasswordVerifier, DEFAULT_BCRYPT_COST};
pub use rate_limit::{
    mask_identity, normalize_identity, AttemptStatus, InMemoryLoginRateLimiter, LoginRateLimitPolicy,
    LoginRateLimiter,
};
pub use rotation::{RefreshOutcome, RotationEngine, RotationPolicy};
pub use token::{hash_token, TokenCodec, TokenCodecConfig};
