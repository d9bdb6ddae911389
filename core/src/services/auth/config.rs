//! Configuration for the authentication coordinator

use std::time::Duration;

use tg_shared::config::{AuthConfig, RefreshCookieConfig};

/// Coordinator settings not owned by the codec or the rotation engine
#[derive(Debug, Clone)]
pub struct AuthCoordinatorConfig {
    /// Revoke the user's other sessions on every successful login
    pub single_session: bool,
    /// Bound for each storage call
    pub storage_timeout: Duration,
    /// Attributes of the refresh token cookie
    pub cookie: RefreshCookieConfig,
}

impl Default for AuthCoordinatorConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for AuthCoordinatorConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            single_session: config.session.single_session,
            storage_timeout: Duration::from_millis(config.session.storage_timeout_ms),
            cookie: config.cookie.clone(),
        }
    }
}
