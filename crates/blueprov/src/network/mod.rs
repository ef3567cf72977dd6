//! Network-configuration collaborator
//!
//! The GATT services never touch the OS network stack themselves. They talk
//! to a [`NetworkConfig`] implementation, which owns the connection records
//! and device state. Only the request/response shape is defined here.

pub mod memory;

use crate::uuid::Uuid;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

pub use memory::{MemoryNetwork, NetworkCall, NetworkSeed, CALL_LOG_CAPACITY};

/// Connection type of WiFi records
pub const WIRELESS_CONNECTION_TYPE: &str = "802-11-wireless";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Network configuration service unavailable")]
    Unavailable,

    #[error("No connection with uuid {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ethernet,
    Wifi,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Ethernet => "ethernet",
            DeviceType::Wifi => "wifi",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nested settings record of a connection, e.g.
/// `{"connection": {"id": "home", "type": "802-11-wireless", "uuid": "..."}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSettings(Value);

impl ConnectionSettings {
    pub fn new(value: Value) -> Self {
        ConnectionSettings(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Settings for a WPA-PSK WiFi connection with automatic addressing.
    pub fn wireless(ssid: &str, psk: &str, uuid: Uuid) -> Self {
        ConnectionSettings(json!({
            "802-11-wireless": {
                "ssid": ssid,
            },
            "802-11-wireless-security": {
                "key-mgmt": "wpa-psk",
                "auth-alg": "open",
                "psk": psk,
            },
            "connection": {
                "id": ssid,
                "type": WIRELESS_CONNECTION_TYPE,
                "uuid": uuid.to_string(),
            },
            "ipv4": { "method": "auto" },
            "ipv6": { "method": "auto" },
        }))
    }

    /// Dotted-path lookup such as `connection.id`.
    ///
    /// Any missing segment, or a leaf that is not a scalar, yields an empty
    /// string.
    pub fn lookup(&self, key: &str) -> String {
        let leaf = key
            .split('.')
            .try_fold(&self.0, |node, segment| node.as_object()?.get(segment));
        match leaf {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn uuid(&self) -> Option<String> {
        Some(self.lookup("connection.uuid")).filter(|s| !s.is_empty())
    }

    pub fn connection_type(&self) -> String {
        self.lookup("connection.type")
    }

    pub fn is_wireless(&self) -> bool {
        self.connection_type() == WIRELESS_CONNECTION_TYPE
    }
}

/// Manager-wide state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerState {
    pub wireless_enabled: bool,
    pub networking_enabled: bool,
    pub connectivity: u32,
    pub state: u32,
}

/// A network device as reported by the collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub interface: String,
    pub device_type: DeviceType,
    /// `(state, reason)`
    #[serde(default)]
    pub state_reason: (u32, u32),
    /// Settings of the active connection, if any
    #[serde(default)]
    pub active_connection: Option<ConnectionSettings>,
}

/// Requests the GATT services issue to the network stack
pub trait NetworkConfig: Send + Sync {
    /// All connection records, of every type
    fn list_connections(&self) -> NetworkResult<Vec<ConnectionSettings>>;

    fn delete_connection(&self, uuid: &str) -> NetworkResult<()>;

    /// Creates a record and returns its uuid.
    fn add_connection(&self, settings: ConnectionSettings) -> NetworkResult<String>;

    fn devices(&self) -> NetworkResult<Vec<Device>>;

    fn manager_state(&self) -> NetworkResult<ManagerState>;
}

/// All `802-11-wireless` records.
pub fn wireless_connections(network: &dyn NetworkConfig) -> NetworkResult<Vec<ConnectionSettings>> {
    Ok(network
        .list_connections()?
        .into_iter()
        .filter(ConnectionSettings::is_wireless)
        .collect())
}

/// First device of the given type, if any.
pub fn current_device(
    network: &dyn NetworkConfig,
    device_type: DeviceType,
) -> NetworkResult<Option<Device>> {
    Ok(network
        .devices()?
        .into_iter()
        .find(|device| device.device_type == device_type))
}

/// Creates a WiFi connection under a freshly generated uuid.
pub fn add_wireless_connection(
    network: &dyn NetworkConfig,
    ssid: &str,
    psk: &str,
) -> NetworkResult<String> {
    network.add_connection(ConnectionSettings::wireless(ssid, psk, Uuid::new_random_v4()))
}
