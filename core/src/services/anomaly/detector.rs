//! Refresh fingerprint assessment

use serde::Serialize;
use tg_shared::config::SessionPolicyConfig;

use crate::domain::entities::Session;
use crate::domain::value_objects::ClientFingerprint;

use super::network::same_network;
use super::user_agent::same_user_agent;

/// Tolerances applied when comparing fingerprints
#[derive(Debug, Clone)]
pub struct AnomalyDetectorConfig {
    /// IPv4 prefix length treated as one network (default: 24)
    pub ipv4_prefix: u8,
    /// IPv6 prefix length treated as one network (default: 48)
    pub ipv6_prefix: u8,
    /// Major version movement tolerated per product (default: 1)
    pub user_agent_major_drift: u32,
}

impl Default for AnomalyDetectorConfig {
    fn default() -> Self {
        Self::from(&SessionPolicyConfig::default())
    }
}

impl From<&SessionPolicyConfig> for AnomalyDetectorConfig {
    fn from(policy: &SessionPolicyConfig) -> Self {
        Self {
            ipv4_prefix: policy.ipv4_prefix,
            ipv6_prefix: policy.ipv6_prefix,
            user_agent_major_drift: policy.user_agent_major_drift,
        }
    }
}

/// Which parts of the fingerprint moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnomalyReport {
    pub ip_changed: bool,
    pub user_agent_changed: bool,
}

impl AnomalyReport {
    pub fn is_anomalous(&self) -> bool {
        self.ip_changed || self.user_agent_changed
    }
}

/// Compares a refresh request against the session's last known client
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyDetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyDetectorConfig) -> Self {
        Self { config }
    }

    /// Compare `current` with the fingerprint of the session's most recent
    /// successful use, or its creation when never refreshed
    pub fn assess(&self, session: &Session, current: &ClientFingerprint) -> AnomalyReport {
        let (baseline_ip, baseline_user_agent) = session.baseline_fingerprint();
        AnomalyReport {
            ip_changed: !same_network(
                baseline_ip,
                &current.ip_address,
                self.config.ipv4_prefix,
                self.config.ipv6_prefix,
            ),
            user_agent_changed: !same_user_agent(
                baseline_user_agent,
                &current.user_agent,
                self.config.user_agent_major_drift,
            ),
        }
    }

    pub fn is_anomalous(&self, session: &Session, current: &ClientFingerprint) -> bool {
        self.assess(session, current).is_anomalous()
    }
}
