//! Authentication coordinator module
//!
//! This module provides the operations exposed to the request layer:
//! - Login with email and password
//! - Token refresh through the rotation engine
//! - Logout of one session or of every session of a user
//! - Access token validation and session listing

mod config;
mod coordinator;

#[cfg(test)]
mod tests;

pub use config::AuthCoordinatorConfig;
pub use coordinator::{AuthCoordinator, LogoutTarget};
