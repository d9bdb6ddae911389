//! Cache module for Redis access
//!
//! Provides the Redis client shared by the Redis-backed services, with
//! connection retry and Lua script invocation.

pub mod redis_client;


pub use redis_client::RedisClient;
