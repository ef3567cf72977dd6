//! In-memory network-configuration collaborator
//!
//! Keeps connection records and device state in process and records the
//! most recent connection requests, so callers can check what was asked of
//! the network stack and in which order.

use super::{ConnectionSettings, Device, DeviceType, ManagerState, NetworkConfig, NetworkError, NetworkResult};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;

/// Requests kept by [`MemoryNetwork::calls`]; older ones are dropped.
pub const CALL_LOG_CAPACITY: usize = 256;

/// One request received by [`MemoryNetwork`]
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkCall {
    ListConnections,
    DeleteConnection(String),
    AddConnection(ConnectionSettings),
}

/// Initial state, as loaded from configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkSeed {
    pub manager: ManagerState,
    pub devices: Vec<Device>,
    pub connections: Vec<ConnectionSettings>,
}

#[derive(Default)]
struct State {
    manager: ManagerState,
    devices: Vec<Device>,
    connections: Vec<ConnectionSettings>,
    calls: VecDeque<NetworkCall>,
    available: bool,
}

impl State {
    fn record(&mut self, call: NetworkCall) {
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

pub struct MemoryNetwork {
    state: Mutex<State>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::from_seed(NetworkSeed::default())
    }

    pub fn from_seed(seed: NetworkSeed) -> Self {
        Self {
            state: Mutex::new(State {
                manager: seed.manager,
                devices: seed.devices,
                connections: seed.connections,
                calls: VecDeque::new(),
                available: true,
            }),
        }
    }

    /// While unavailable every request fails with `NetworkError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    pub fn set_manager_state(&self, manager: ManagerState) {
        self.state.lock().manager = manager;
    }

    /// Replaces any device of the same type.
    pub fn put_device(&self, device: Device) {
        let mut state = self.state.lock();
        state.devices.retain(|d| d.device_type != device.device_type);
        state.devices.push(device);
    }

    pub fn remove_device(&self, device_type: DeviceType) {
        self.state.lock().devices.retain(|d| d.device_type != device_type);
    }

    pub fn insert_connection(&self, settings: ConnectionSettings) {
        self.state.lock().connections.push(settings);
    }

    pub fn connections(&self) -> Vec<ConnectionSettings> {
        self.state.lock().connections.clone()
    }

    pub fn calls(&self) -> Vec<NetworkCall> {
        self.state.lock().calls.iter().cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn ensure_available(state: &State) -> NetworkResult<()> {
        if state.available {
            Ok(())
        } else {
            Err(NetworkError::Unavailable)
        }
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkConfig for MemoryNetwork {
    fn list_connections(&self) -> NetworkResult<Vec<ConnectionSettings>> {
        let mut state = self.state.lock();
        Self::ensure_available(&state)?;
        state.record(NetworkCall::ListConnections);
        Ok(state.connections.clone())
    }

    fn delete_connection(&self, uuid: &str) -> NetworkResult<()> {
        let mut state = self.state.lock();
        Self::ensure_available(&state)?;
        state.record(NetworkCall::DeleteConnection(uuid.to_string()));

        let before = state.connections.len();
        state
            .connections
            .retain(|c| c.uuid().as_deref() != Some(uuid));
        if state.connections.len() == before {
            return Err(NetworkError::NotFound(uuid.to_string()));
        }
        Ok(())
    }

    fn add_connection(&self, settings: ConnectionSettings) -> NetworkResult<String> {
        let mut state = self.state.lock();
        Self::ensure_available(&state)?;
        state.record(NetworkCall::AddConnection(settings.clone()));

        let uuid = settings
            .uuid()
            .ok_or_else(|| NetworkError::Rejected("connection.uuid missing".into()))?;
        if state.connections.iter().any(|c| c.uuid().as_deref() == Some(uuid.as_str())) {
            return Err(NetworkError::Rejected(format!("duplicate uuid {}", uuid)));
        }
        state.connections.push(settings);
        Ok(uuid)
    }

    fn devices(&self) -> NetworkResult<Vec<Device>> {
        let state = self.state.lock();
        Self::ensure_available(&state)?;
        Ok(state.devices.clone())
    }

    fn manager_state(&self) -> NetworkResult<ManagerState> {
        let state = self.state.lock();
        Self::ensure_available(&state)?;
        Ok(state.manager)
    }
}
