//! Client fingerprint captured from a request.

use serde::{Deserialize, Serialize};

/// The (IP, user agent) pair characterising the client of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFingerprint {
    pub ip_address: String,
    pub user_agent: String,
    /// Free-form client description supplied by the caller
    pub device_info: Option<String>,
}

impl ClientFingerprint {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into().trim().to_string(),
            user_agent: user_agent.into().trim().to_string(),
            device_info: None,
        }
    }

    pub fn with_device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }
}
