//! Refresh token rotation
//!
//! This module handles:
//! - Validation of a presented refresh token against its session row
//! - Reuse detection with cascading revocation
//! - Rotation or in-place refresh of the session

mod engine;
mod policy;


pub use engine::{RefreshOutcome, RotationEngine};
pub use policy::RotationPolicy;
