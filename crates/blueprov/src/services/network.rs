//! Network provisioning service
//!
//! Layout of the service (indices are protocol-fixed):
//!
//! | index | characteristic            | flags          |
//! |-------|---------------------------|----------------|
//! | 1     | manager state (4 bytes)   | read, notify   |
//! | 2     | wireless configuration    | secure-write   |
//! | 3     | ethernet device state     | read, notify   |
//! | 4     | wifi device state         | read, notify   |
//!
//! Each device state characteristic carries three descriptors with the
//! active connection's type, id and uuid.

use super::provisioning::WirelessConfigurationCharacteristic;
use super::status::{StatusCharacteristic, StatusSource};
use crate::config::ServerConfig;
use crate::error::GattResult;
use crate::gatt::{
    Access, AttributeTree, CharacteristicId, DescriptorContext, DescriptorHandler, Flags,
    Options, ServiceId, TreeResult,
};
use crate::network::{current_device, DeviceType, NetworkConfig};
use crate::uuid::Uuid;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const NETWORK_SVC_UUID: Uuid = Uuid::from_u128(0x22345678_1234_5678_1234_56789abcdef1);
pub const NETWORK_MANAGER_STATE_CHRC_UUID: Uuid =
    Uuid::from_u128(0x22345678_1234_5678_1234_56781abcdee2);
pub const WIRELESS_CONFIGURATION_CHRC_UUID: Uuid =
    Uuid::from_u128(0x97345678_1234_5678_1234_56781abddee2);
pub const ETHERNET_DEVICE_STATE_CHRC_UUID: Uuid =
    Uuid::from_u128(0x42345678_1234_5678_1234_56781abcdee2);
pub const WIFI_DEVICE_STATE_CHRC_UUID: Uuid =
    Uuid::from_u128(0x32345678_1234_5678_1234_56781abcdee2);
pub const CONN_TYPE_DESC_UUID: Uuid = Uuid::from_u128(0x72345678_1234_5678_1234_56789abcdef2);
pub const CONN_ID_DESC_UUID: Uuid = Uuid::from_u128(0x72345678_1234_5678_1234_56789abcdef3);
pub const CONN_UUID_DESC_UUID: Uuid = Uuid::from_u128(0x72345678_1234_5678_1234_56789abcdef4);

/// Byte encoding of an enumerant; values past 255 saturate.
fn enum_byte(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// `[wireless-enabled, networking-enabled, connectivity, state]`
pub struct ManagerStateSource {
    network: Arc<dyn NetworkConfig>,
}

impl ManagerStateSource {
    pub fn new(network: Arc<dyn NetworkConfig>) -> Self {
        Self { network }
    }
}

impl StatusSource for ManagerStateSource {
    fn label(&self) -> String {
        "NM state".into()
    }

    fn expected_len(&self) -> usize {
        4
    }

    fn read(&self) -> GattResult<Vec<u8>> {
        let state = self.network.manager_state()?;
        info!(
            wireless_enabled = state.wireless_enabled,
            networking_enabled = state.networking_enabled,
            connectivity = state.connectivity,
            state = state.state,
            "NM state"
        );
        Ok(vec![
            u8::from(state.wireless_enabled),
            u8::from(state.networking_enabled),
            enum_byte(state.connectivity),
            enum_byte(state.state),
        ])
    }
}

/// `[state, reason]` of the current device of one type, empty when absent
pub struct DeviceStateSource {
    network: Arc<dyn NetworkConfig>,
    device_type: DeviceType,
}

impl DeviceStateSource {
    pub fn new(network: Arc<dyn NetworkConfig>, device_type: DeviceType) -> Self {
        Self {
            network,
            device_type,
        }
    }
}

impl StatusSource for DeviceStateSource {
    fn label(&self) -> String {
        format!("NM {} device state", self.device_type)
    }

    fn expected_len(&self) -> usize {
        2
    }

    fn read(&self) -> GattResult<Vec<u8>> {
        Ok(match current_device(self.network.as_ref(), self.device_type)? {
            Some(device) => vec![
                enum_byte(device.state_reason.0),
                enum_byte(device.state_reason.1),
            ],
            None => Vec::new(),
        })
    }
}

/// One setting of the active connection of a device, as UTF-8 text
pub struct ActiveConnectionDescriptor {
    network: Arc<dyn NetworkConfig>,
    device_type: DeviceType,
    key: &'static str,
}

impl ActiveConnectionDescriptor {
    pub fn new(network: Arc<dyn NetworkConfig>, device_type: DeviceType, key: &'static str) -> Self {
        Self {
            network,
            device_type,
            key,
        }
    }

    fn read_setting(&self) -> GattResult<String> {
        let setting = current_device(self.network.as_ref(), self.device_type)?
            .and_then(|device| device.active_connection)
            .map(|settings| settings.lookup(self.key))
            .unwrap_or_default();
        Ok(setting)
    }
}

impl DescriptorHandler for ActiveConnectionDescriptor {
    fn init(&mut self, ctx: &mut DescriptorContext<'_>) {
        match self.read_setting() {
            Ok(setting) => ctx.set_value(setting.into_bytes()),
            Err(e) => warn!(path = %ctx.path(), error = %e, "initial read failed"),
        }
    }

    fn read_value(
        &mut self,
        ctx: &mut DescriptorContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        ctx.require(Access::Read)?;
        let setting = self.read_setting()?;
        info!(
            device_type = %self.device_type,
            key = self.key,
            value = %setting,
            "read NM device active connection setting"
        );
        ctx.set_value(setting.into_bytes());
        Ok(ctx.value().to_vec())
    }
}

fn add_device_state_characteristic(
    tree: &mut AttributeTree,
    service: ServiceId,
    index: u16,
    uuid: Uuid,
    device_type: DeviceType,
    network: &Arc<dyn NetworkConfig>,
    interval: Duration,
) -> TreeResult<CharacteristicId> {
    let chrc = tree.add_characteristic(
        service,
        index,
        uuid,
        Flags::READ | Flags::NOTIFY,
        StatusCharacteristic::new(DeviceStateSource::new(network.clone(), device_type), interval),
    )?;

    let settings = [
        (CONN_TYPE_DESC_UUID, "connection.type"),
        (CONN_ID_DESC_UUID, "connection.id"),
        (CONN_UUID_DESC_UUID, "connection.uuid"),
    ];
    for (desc_index, (desc_uuid, key)) in (0u16..).zip(settings) {
        tree.add_descriptor(
            chrc,
            desc_index,
            desc_uuid,
            Flags::READ,
            ActiveConnectionDescriptor::new(network.clone(), device_type, key),
        )?;
    }
    Ok(chrc)
}

/// Mounts the network service at `index`.
pub fn register_network_service(
    tree: &mut AttributeTree,
    index: u16,
    network: Arc<dyn NetworkConfig>,
    config: &ServerConfig,
) -> TreeResult<ServiceId> {
    let interval = config.poll_interval();
    let service = tree.add_service(index, NETWORK_SVC_UUID, true)?;
    info!(uuid = %NETWORK_SVC_UUID, "initialize NM service");

    tree.add_characteristic(
        service,
        1,
        NETWORK_MANAGER_STATE_CHRC_UUID,
        Flags::READ | Flags::NOTIFY,
        StatusCharacteristic::new(ManagerStateSource::new(network.clone()), interval),
    )?;
    tree.add_characteristic(
        service,
        2,
        WIRELESS_CONFIGURATION_CHRC_UUID,
        Flags::SECURE_WRITE,
        WirelessConfigurationCharacteristic::new(network.clone()),
    )?;
    add_device_state_characteristic(
        tree,
        service,
        3,
        ETHERNET_DEVICE_STATE_CHRC_UUID,
        DeviceType::Ethernet,
        &network,
        interval,
    )?;
    add_device_state_characteristic(
        tree,
        service,
        4,
        WIFI_DEVICE_STATE_CHRC_UUID,
        DeviceType::Wifi,
        &network,
        interval,
    )?;
    Ok(service)
}
