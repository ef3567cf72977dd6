//! Blueprov - BLE GATT provisioning peripheral
//!
//! This library exposes a host's network state over GATT and lets a nearby
//! peer hand it WiFi credentials. It provides the application object model
//! registered with the attribute-protocol manager, the network provisioning
//! and test services mounted on it, and a single-task server that serializes
//! peer requests with the services' sampling timers.

pub mod config;
pub mod error;
pub mod gatt;
pub mod network;
pub mod services;
pub mod uuid;

// Re-export common types for convenience
pub use config::{DispatchPolicy, ServerConfig};
pub use error::{GattError, GattResult};
pub use gatt::{AttributeTree, GattServer, ObjectPath, Options, PropertiesChanged, ServerHandle};
pub use network::{MemoryNetwork, NetworkConfig, NetworkSeed};
pub use services::build_application;
pub use uuid::Uuid;
