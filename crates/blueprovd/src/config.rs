//! Daemon configuration file

use std::path::Path;

use anyhow::Context;
use blueprov::{NetworkSeed, ServerConfig};
use serde::Deserialize;

/// Top-level TOML document
///
/// ```toml
/// [server]
/// poll_interval_ms = 5000
/// dispatch = "advisory"
/// test_service = true
///
/// [network.manager]
/// wireless_enabled = true
/// networking_enabled = true
/// connectivity = 4
/// state = 70
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    /// Initial state of the in-process network collaborator
    pub network: NetworkSeed,
}

impl DaemonConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("loading {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprov::network::DeviceType;
    use blueprov::DispatchPolicy;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = DaemonConfig::parse("").unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.network, NetworkSeed::default());
    }

    #[test]
    fn parses_server_and_network_sections() {
        let config = DaemonConfig::parse(
            r#"
            [server]
            poll_interval_ms = 250
            dispatch = "enforced"
            test_service = true

            [network.manager]
            wireless_enabled = true
            connectivity = 4

            [[network.devices]]
            interface = "wlan0"
            device_type = "wifi"
            state_reason = [100, 0]

            [[network.connections]]
            connection = { id = "home", type = "802-11-wireless", uuid = "w-1" }
            "#,
        )
        .unwrap();

        assert_eq!(config.server.poll_interval_ms, 250);
        assert_eq!(config.server.dispatch, DispatchPolicy::Enforced);
        assert!(config.server.test_service);
        assert!(config.network.manager.wireless_enabled);
        assert!(!config.network.manager.networking_enabled);
        assert_eq!(config.network.devices[0].device_type, DeviceType::Wifi);
        assert_eq!(config.network.devices[0].state_reason, (100, 0));
        assert_eq!(config.network.connections[0].uuid().as_deref(), Some("w-1"));
    }

    #[test]
    fn unknown_dispatch_policy_is_an_error() {
        assert!(DaemonConfig::parse("[server]\ndispatch = \"sometimes\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(DaemonConfig::load(Some(Path::new("/nonexistent/blueprovd.toml"))).is_err());
        assert!(DaemonConfig::load(None).is_ok());
    }
}
