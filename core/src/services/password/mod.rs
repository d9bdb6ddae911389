//! Password verification
//!
//! The coordinator only sees the [`PasswordVerifier`] trait; the bcrypt
//! implementation runs hashing on the blocking thread pool.

mod bcrypt_verifier;

pub use bcrypt_verifier::{BcryptPasswordVerifier, DEFAULT_BCRYPT_COST};

use async_trait::async_trait;

/// Checks a plaintext password against a stored hash
#[async_trait]
pub trait PasswordVerifier: Send + Sync {
    /// Returns false for a mismatch and for an unreadable hash alike
    async fn verify(&self, plaintext: &str, stored_hash: &str) -> bool;

    /// Spend the same effort as [`verify`](PasswordVerifier::verify) without a
    /// real hash, so unknown identities take as long as wrong passwords
    async fn verify_dummy(&self, _plaintext: &str) {}
}
