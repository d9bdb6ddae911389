//! Lua scripts run by [`RedisLoginRateLimiter`](super::RedisLoginRateLimiter)
//!
//! Every script takes `KEYS[1]` = counter hash (`failed`, `pending`) and
//! `KEYS[2]` = lock key. The counter expires one window after the first
//! admitted attempt; a lock expires after the lockout, together with the
//! counter it froze.

use once_cell::sync::Lazy;
use redis::Script;

/// ARGV: max attempts, window seconds.
/// Returns `{0, 0}` when admitted, `{1, seconds}` when locked,
/// `{2, 1}` when the threshold is saturated by in-flight attempts.
pub(super) static CHECK: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local lock_ms = redis.call('PTTL', KEYS[2])
if lock_ms > 0 then
  return {1, math.ceil(lock_ms / 1000)}
end
local failed = tonumber(redis.call('HGET', KEYS[1], 'failed') or '0')
local pending = tonumber(redis.call('HGET', KEYS[1], 'pending') or '0')
if failed + pending >= tonumber(ARGV[1]) then
  return {2, 1}
end
redis.call('HINCRBY', KEYS[1], 'pending', 1)
if redis.call('TTL', KEYS[1]) < 0 then
  redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return {0, 0}
"#,
    )
});

/// ARGV: max attempts, window seconds, lockout seconds.
/// Returns `{failed, lock_seconds_remaining, locked_now}`.
pub(super) static RECORD_FAILURE: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local pending = tonumber(redis.call('HGET', KEYS[1], 'pending') or '0')
if pending > 0 then
  redis.call('HINCRBY', KEYS[1], 'pending', -1)
end
local failed = redis.call('HINCRBY', KEYS[1], 'failed', 1)
if redis.call('TTL', KEYS[1]) < 0 then
  redis.call('EXPIRE', KEYS[1], ARGV[2])
end
local lock_ms = redis.call('PTTL', KEYS[2])
if lock_ms > 0 then
  return {failed, math.ceil(lock_ms / 1000), 0}
end
if failed >= tonumber(ARGV[1]) then
  redis.call('SET', KEYS[2], '1', 'EX', ARGV[3])
  redis.call('EXPIRE', KEYS[1], ARGV[3])
  return {failed, tonumber(ARGV[3]), 1}
end
return {failed, 0, 0}
"#,
    )
});

/// Gives back one pending slot. Returns the remaining pending count.
pub(super) static RELEASE: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local pending = tonumber(redis.call('HGET', KEYS[1], 'pending') or '0')
if pending > 0 then
  return redis.call('HINCRBY', KEYS[1], 'pending', -1)
end
return 0
"#,
    )
});
