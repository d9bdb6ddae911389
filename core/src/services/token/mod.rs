//! Token codec module
//!
//! This module handles:
//! - HS256 access and refresh token signing with separate keys
//! - Structural verification of presented tokens
//! - Hashing of refresh tokens for storage

mod codec;
mod config;


pub use codec::{hash_token, TokenCodec};
pub use config::TokenCodecConfig;
