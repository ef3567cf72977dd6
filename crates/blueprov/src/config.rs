//! Server configuration

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SERVICE_PATH_BASE: &str = "/org/bluez/example/service";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// How the tree treats declared flags before invoking a handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPolicy {
    /// Flags are metadata only; each handler checks them itself.
    #[default]
    Advisory,
    /// The tree rejects operations the flags do not declare.
    Enforced,
}

/// GATT server configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Sampling period of the status characteristics
    pub poll_interval_ms: u64,
    pub dispatch: DispatchPolicy,
    /// Service paths are `<base><index>`
    pub service_path_base: String,
    /// Mount the test service next to the network service
    pub test_service: bool,
}

impl ServerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dispatch: DispatchPolicy::Advisory,
            service_path_base: DEFAULT_SERVICE_PATH_BASE.to_string(),
            test_service: false,
        }
    }
}
