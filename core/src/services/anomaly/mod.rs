//! Fingerprint drift detection for refresh requests

mod detector;
mod network;
mod user_agent;

pub use detector::{AnomalyDetector, AnomalyDetectorConfig, AnomalyReport};
pub use network::same_network;
pub use user_agent::{same_user_agent, user_agent_skeleton};
