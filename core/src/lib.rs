//! # Tollgate Core
//!
//! Domain layer of the Tollgate credential service: access and refresh token
//! issuance, refresh-token sessions with rotation families, reuse detection,
//! fingerprint anomaly checks and failed-login throttling.
//!
//! Persistence is reached only through the traits in [`repositories`];
//! in-memory implementations live next to the traits so the whole flow can
//! run without a database.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
