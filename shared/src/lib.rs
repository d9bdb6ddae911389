//! Shared configuration and common types for Tollgate
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types and layered loading
//! - Error response structures and stable error codes

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, ConfigLoadError, DatabaseConfig, Environment, JwtConfig,
    LogFormat, LoggingConfig, LoginRateLimitConfig, RateLimitConfig, RefreshCookieConfig,
    ReuseRevocationScope, SessionPolicyConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
