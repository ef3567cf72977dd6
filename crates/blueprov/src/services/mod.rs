//! Concrete GATT services

pub mod network;
pub mod provisioning;
pub mod status;
pub mod test_service;

use crate::config::ServerConfig;
use crate::gatt::{AttributeTree, TreeResult};
use crate::network::NetworkConfig;
use std::sync::Arc;

pub use network::register_network_service;
pub use provisioning::{Credentials, WirelessConfigurationCharacteristic};
pub use status::{StatusCharacteristic, StatusSource};
pub use test_service::register_test_service;

/// Builds the application tree: the network service at index 0, followed
/// by the test service when enabled.
pub fn build_application(
    network: Arc<dyn NetworkConfig>,
    config: &ServerConfig,
) -> TreeResult<AttributeTree> {
    let mut tree = AttributeTree::new(config);
    register_network_service(&mut tree, 0, network, config)?;
    if config.test_service {
        register_test_service(&mut tree, 1)?;
    }
    Ok(tree)
}
