//! Login throttling backed by shared storage

mod configured;
mod redis_limiter;
mod scripts;

pub use configured::ConfiguredLoginRateLimiter;
pub use redis_limiter::RedisLoginRateLimiter;
