//! bcrypt-backed password verifier

use async_trait::async_trait;
use tracing::error;

use super::PasswordVerifier;
use crate::errors::{AuthError, AuthResult};

pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

const DUMMY_PASSWORD: &str = "tollgate-timing-equaliser";

/// Verifies bcrypt hashes on `spawn_blocking`
pub struct BcryptPasswordVerifier {
    /// Hash checked against when the identity does not exist
    dummy_hash: String,
}

impl BcryptPasswordVerifier {
    /// Creates a verifier whose dummy hash uses `cost`
    ///
    /// The cost should match the stored hashes so both paths take equally
    /// long.
    pub fn new(cost: u32) -> AuthResult<Self> {
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, cost).map_err(|e| {
            error!(error = %e, cost = cost, "Failed to prepare bcrypt dummy hash");
            AuthError::Internal
        })?;
        Ok(Self { dummy_hash })
    }

    pub fn with_default_cost() -> AuthResult<Self> {
        Self::new(DEFAULT_BCRYPT_COST)
    }

    /// Hash a password for storage
    pub async fn hash(plaintext: &str, cost: u32) -> AuthResult<String> {
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|_| AuthError::Internal)?
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                AuthError::Internal
            })
    }

    async fn check(plaintext: &str, hash: &str) -> bool {
        let plaintext = plaintext.to_string();
        let hash = hash.to_string();
        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(_)) => false,
            Err(e) => {
                error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

#[async_trait]
impl PasswordVerifier for BcryptPasswordVerifier {
    async fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        Self::check(plaintext, stored_hash).await
    }

    async fn verify_dummy(&self, plaintext: &str) {
        let _ = Self::check(plaintext, &self.dummy_hash).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_verify_matching_password() {
        let verifier = BcryptPasswordVerifier::new(4).unwrap();
        let hash = BcryptPasswordVerifier::hash("correct horse", 4).await.unwrap();

        assert!(verifier.verify("correct horse", &hash).await);
        assert!(!verifier.verify("battery staple", &hash).await);
    }

    #[tokio::test]
    async fn test_malformed_hash_is_mismatch() {
        let verifier = BcryptPasswordVerifier::new(4).unwrap();
        assert!(!verifier.verify("anything", "not-a-bcrypt-hash").await);
    }

    #[tokio::test]
    async fn test_dummy_verification_completes() {
        let verifier = BcryptPasswordVerifier::new(4).unwrap();
        verifier.verify_dummy("whatever").await;
    }
}
