//! Rotation and refresh thresholds

use chrono::{DateTime, Duration, Utc};
use tg_shared::config::{ReuseRevocationScope, SessionPolicyConfig};

use crate::domain::entities::Session;

/// Policy knobs of the rotation engine
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    /// Minimum time between two successful refreshes of one session
    pub min_refresh_interval: Duration,
    /// Session age that triggers rotation
    pub rotation_age: Duration,
    /// Refresh count that triggers rotation
    pub rotation_refresh_count: u32,
    pub always_rotate: bool,
    /// Fail anomalous refreshes with `SessionRevoked`
    pub revoke_on_anomaly: bool,
    /// Sessions revoked when a rotated token is replayed
    pub reuse_scope: ReuseRevocationScope,
    /// Bound for each storage call
    pub storage_timeout: std::time::Duration,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from(&SessionPolicyConfig::default())
    }
}

impl From<&SessionPolicyConfig> for RotationPolicy {
    fn from(config: &SessionPolicyConfig) -> Self {
        Self {
            min_refresh_interval: Duration::seconds(config.min_refresh_interval),
            rotation_age: Duration::seconds(config.rotation_age),
            rotation_refresh_count: config.rotation_refresh_count,
            always_rotate: config.always_rotate,
            revoke_on_anomaly: config.revoke_on_anomaly,
            reuse_scope: config.reuse_revocation_scope,
            storage_timeout: std::time::Duration::from_millis(config.storage_timeout_ms),
        }
    }
}

impl RotationPolicy {
    /// Whether a refresh of `session` at `now` issues a new refresh token
    pub fn should_rotate(&self, session: &Session, now: DateTime<Utc>) -> bool {
        self.always_rotate
            || now - session.created_at >= self.rotation_age
            || session.refresh_count >= self.rotation_refresh_count
    }

    /// Whole seconds left before `session` may be refreshed again, if any
    pub fn too_soon(&self, session: &Session, now: DateTime<Utc>) -> Option<u64> {
        let elapsed = now - session.last_activity();
        if elapsed >= self.min_refresh_interval {
            return None;
        }
        let remaining_ms = (self.min_refresh_interval - elapsed).num_milliseconds();
        Some(((remaining_ms + 999) / 1000).max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ClientFingerprint;
    use uuid::Uuid;

    fn session(created_at: DateTime<Utc>) -> Session {
        Session::new(
            Uuid::new_v4(),
            "hash".to_string(),
            &ClientFingerprint::new("10.0.0.1", "curl/8.0"),
            created_at,
            created_at + Duration::days(7),
        )
    }

    #[test]
    fn test_rotation_by_age() {
        let policy = RotationPolicy::default();
        let now = Utc::now();
        let s = session(now);
        assert!(!policy.should_rotate(&s, now + Duration::hours(23)));
        assert!(policy.should_rotate(&s, now + Duration::hours(24)));
    }

    #[test]
    fn test_rotation_by_count() {
        let policy = RotationPolicy::default();
        let now = Utc::now();
        let mut s = session(now);
        s.refresh_count = 9;
        assert!(!policy.should_rotate(&s, now));
        s.refresh_count = 10;
        assert!(policy.should_rotate(&s, now));
    }

    #[test]
    fn test_always_rotate() {
        let policy = RotationPolicy {
            always_rotate: true,
            ..RotationPolicy::default()
        };
        let now = Utc::now();
        assert!(policy.should_rotate(&session(now), now));
    }

    #[test]
    fn test_too_soon_rounds_up() {
        let policy = RotationPolicy::default();
        let now = Utc::now();
        let s = session(now);
        assert_eq!(policy.too_soon(&s, now), Some(10));
        assert_eq!(policy.too_soon(&s, now + Duration::milliseconds(9500)), Some(1));
        assert_eq!(policy.too_soon(&s, now + Duration::seconds(10)), None);
    }
}
