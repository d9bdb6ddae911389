//! Configuration for the token codec

use chrono::Duration;
use sha2::{Digest, Sha256};
use tg_shared::config::JwtConfig;

/// Domain-separation label mixed into a derived refresh secret
const REFRESH_SECRET_LABEL: &str = "tollgate.refresh-token:";

/// Configuration for the token codec
#[derive(Debug, Clone)]
pub struct TokenCodecConfig {
    /// Secret signing access tokens
    pub access_secret: String,
    /// Secret signing refresh tokens; derived from `access_secret` when absent
    pub refresh_secret: Option<String>,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Tolerated clock skew for `exp` and `nbf`
    pub leeway: Duration,
}

impl Default for TokenCodecConfig {
    fn default() -> Self {
        Self::from(&JwtConfig::default())
    }
}

impl From<&JwtConfig> for TokenCodecConfig {
    fn from(config: &JwtConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            issuer: config.issuer.clone(),
            access_ttl: Duration::seconds(config.access_token_ttl),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl),
            leeway: Duration::seconds(config.leeway),
        }
    }
}

impl TokenCodecConfig {
    pub fn new(access_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            ..Default::default()
        }
    }

    /// Key material for refresh tokens
    pub(crate) fn refresh_key_material(&self) -> Vec<u8> {
        match &self.refresh_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                let mut hasher = Sha256::new();
                hasher.update(REFRESH_SECRET_LABEL.as_bytes());
                hasher.update(self.access_secret.as_bytes());
                hex::encode(hasher.finalize()).into_bytes()
            }
        }
    }
}
