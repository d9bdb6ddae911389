//! Failed login throttling
//!
//! This module provides:
//! - The [`LoginRateLimiter`] contract used by the auth coordinator
//! - An in-process implementation for single-instance deployments
//! - [`AttemptReservation`], the slot a login holds until it settles
//! - Identity normalisation and masking helpers

mod config;
mod identity;
mod limiter;
mod memory;
mod reservation;

pub use config::LoginRateLimitPolicy;
pub use identity::{mask_identity, normalize_identity};
pub use limiter::{AttemptStatus, LoginRateLimiter};
pub use memory::InMemoryLoginRateLimiter;
pub use reservation::AttemptReservation;
