//! Infrastructure implementations of core service contracts

pub mod rate_limit;

pub use rate_limit::{ConfiguredLoginRateLimiter, RedisLoginRateLimiter};
