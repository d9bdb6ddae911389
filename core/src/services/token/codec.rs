//! Signing and verification of access and refresh tokens

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, error};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::entities::{IssuedToken, Principal, RefreshClaims, RefreshTokenInfo, TokenClaims};
use crate::errors::{AuthError, AuthResult};

use super::config::TokenCodecConfig;

/// Hash a raw token for storage and lookup
///
/// # Returns
///
/// Lowercase hexadecimal SHA-256 of the token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stateless HS256 codec for access and refresh tokens
///
/// Access and refresh tokens are signed with different keys, so one kind can
/// never be presented as the other. Every parse failure collapses to
/// [`AuthError::InvalidToken`].
pub struct TokenCodec {
    config: TokenCodecConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Creates a new codec
    ///
    /// # Arguments
    ///
    /// * `config` - Secrets, issuer and lifetimes
    /// * `clock` - Time source for issuance and expiry checks
    pub fn new(config: TokenCodecConfig, clock: Arc<dyn Clock>) -> Self {
        let refresh_key = config.refresh_key_material();

        // Only HS256 is accepted; the header's `alg` must match exactly
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_aud = false;
        // Time checks run against the injected clock in `check_window`
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(&refresh_key),
            refresh_decoding: DecodingKey::from_secret(&refresh_key),
            validation,
            config,
            clock,
        }
    }

    /// Issues an access token for a principal
    pub fn issue_access(&self, principal: &Principal) -> AuthResult<IssuedToken> {
        let now = self.clock.now();
        let claims = TokenClaims::for_principal(principal, &self.config.issuer, now, self.config.access_ttl);
        let token = self.sign(&claims, &self.access_encoding)?;
        Ok(IssuedToken {
            token,
            expires_at: timestamp(claims.exp)?,
        })
    }

    /// Issues a refresh token for a user
    pub fn issue_refresh(&self, user_id: Uuid) -> AuthResult<IssuedToken> {
        let now = self.clock.now();
        let claims = RefreshClaims::for_user(user_id, &self.config.issuer, now, self.config.refresh_ttl);
        let token = self.sign(&claims, &self.refresh_encoding)?;
        Ok(IssuedToken {
            token,
            expires_at: timestamp(claims.exp)?,
        })
    }

    /// Verifies an access token and returns its claims
    ///
    /// # Returns
    ///
    /// * `Ok(TokenClaims)` - Signature, issuer and validity window check out
    /// * `Err(AuthError::InvalidToken)` - Anything else
    pub fn parse_access(&self, token: &str) -> AuthResult<TokenClaims> {
        let claims: TokenClaims = self.verify(token, &self.access_decoding)?;
        self.check_window(claims.exp, claims.nbf)?;
        if claims.user_id().is_none() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verifies a refresh token structurally
    ///
    /// Checks signature, issuer and validity window only; whether the
    /// session behind it is still usable is decided by the session store.
    pub fn parse_refresh(&self, token: &str) -> AuthResult<RefreshTokenInfo> {
        let claims: RefreshClaims = self.verify(token, &self.refresh_decoding)?;
        self.check_window(claims.exp, claims.nbf)?;
        let subject = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(RefreshTokenInfo {
            subject,
            expires_at: timestamp(claims.exp).map_err(|_| AuthError::InvalidToken)?,
        })
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_seconds(&self) -> i64 {
        self.config.access_ttl.num_seconds()
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.config.refresh_ttl.num_seconds()
    }

    fn sign<T: serde::Serialize>(&self, claims: &T, key: &EncodingKey) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            AuthError::Internal
        })
    }

    fn verify<T: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> AuthResult<T> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = ?e.kind(), "Token rejected");
                AuthError::InvalidToken
            })
    }

    fn check_window(&self, exp: i64, nbf: i64) -> AuthResult<()> {
        let now = self.clock.now().timestamp();
        let leeway = self.config.leeway.num_seconds();
        if now > exp + leeway {
            debug!("Token rejected: expired");
            return Err(AuthError::InvalidToken);
        }
        if nbf > now + leeway {
            debug!("Token rejected: not yet valid");
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }
}

fn timestamp(seconds: i64) -> AuthResult<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single().ok_or(AuthError::Internal)
}
