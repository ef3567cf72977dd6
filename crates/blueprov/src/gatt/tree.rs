//! Attribute tree
//!
//! The tree owns every node in three arenas. Owner links are typed indices,
//! so a characteristic refers to its service, and a descriptor to its
//! characteristic, without owning them. Paths are computed once when a node
//! is added and indexed for dispatch.

use super::node::{
    CharacteristicContext, CharacteristicHandler, DescriptorContext, DescriptorHandler,
    NotifyState,
};
use super::types::*;
use crate::config::{DispatchPolicy, ServerConfig};
use crate::error::{GattError, GattResult};
use crate::uuid::Uuid;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacteristicId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(usize);

/// Errors raised while building the tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Duplicate object path: {0}")]
    DuplicatePath(ObjectPath),

    #[error("Owner does not belong to this tree")]
    UnknownOwner,
}

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Debug, Clone, Copy)]
enum NodeRef {
    Service(ServiceId),
    Characteristic(CharacteristicId),
    Descriptor(DescriptorId),
}

struct ServiceNode {
    path: ObjectPath,
    uuid: Uuid,
    primary: bool,
    characteristics: Vec<CharacteristicId>,
}

struct CharacteristicNode {
    path: ObjectPath,
    uuid: Uuid,
    flags: Flags,
    service: ServiceId,
    descriptors: Vec<DescriptorId>,
    value: Vec<u8>,
    subscribed: bool,
    handler: Box<dyn CharacteristicHandler>,
}

struct DescriptorNode {
    path: ObjectPath,
    uuid: Uuid,
    flags: Flags,
    characteristic: CharacteristicId,
    value: Vec<u8>,
    handler: Box<dyn DescriptorHandler>,
}

/// The GATT application: root object plus every registered node
pub struct AttributeTree {
    root: ObjectPath,
    service_path_base: String,
    policy: DispatchPolicy,
    services: Vec<ServiceNode>,
    characteristics: Vec<CharacteristicNode>,
    descriptors: Vec<DescriptorNode>,
    index: HashMap<ObjectPath, NodeRef>,
    signals: Vec<PropertiesChanged>,
}

impl AttributeTree {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            root: ObjectPath::root(),
            service_path_base: config.service_path_base.clone(),
            policy: config.dispatch,
            services: Vec::new(),
            characteristics: Vec::new(),
            descriptors: Vec::new(),
            index: HashMap::new(),
            signals: Vec::new(),
        }
    }

    /// Path registered with the attribute-protocol manager
    pub fn root(&self) -> &ObjectPath {
        &self.root
    }

    fn claim(&mut self, path: &ObjectPath, node: NodeRef) -> TreeResult<()> {
        if self.index.contains_key(path) {
            return Err(TreeError::DuplicatePath(path.clone()));
        }
        self.index.insert(path.clone(), node);
        Ok(())
    }

    /// Adds a service at `<base><index>`.
    pub fn add_service(
        &mut self,
        index: u16,
        uuid: impl Into<Uuid>,
        primary: bool,
    ) -> TreeResult<ServiceId> {
        let uuid = uuid.into();
        let path = ObjectPath::new(format!("{}{}", self.service_path_base, index));
        let id = ServiceId(self.services.len());
        self.claim(&path, NodeRef::Service(id))?;

        info!(%path, %uuid, "registered service");
        self.services.push(ServiceNode {
            path,
            uuid,
            primary,
            characteristics: Vec::new(),
        });
        Ok(id)
    }

    /// Adds a characteristic at `<service>/char<index>` and runs its `init`.
    pub fn add_characteristic(
        &mut self,
        service: ServiceId,
        index: u16,
        uuid: impl Into<Uuid>,
        flags: Flags,
        handler: impl CharacteristicHandler + 'static,
    ) -> TreeResult<CharacteristicId> {
        let uuid = uuid.into();
        let path = self
            .services
            .get(service.0)
            .ok_or(TreeError::UnknownOwner)?
            .path
            .child("char", index);
        let id = CharacteristicId(self.characteristics.len());
        self.claim(&path, NodeRef::Characteristic(id))?;

        info!(%path, %uuid, flags = ?flags.tokens(), "registered characteristic");
        self.characteristics.push(CharacteristicNode {
            path,
            uuid,
            flags,
            service,
            descriptors: Vec::new(),
            value: Vec::new(),
            subscribed: false,
            handler: Box::new(handler),
        });
        self.services[service.0].characteristics.push(id);

        self.with_characteristic(id, |handler, ctx| handler.init(ctx));
        Ok(id)
    }

    /// Adds a descriptor at `<characteristic>/desc<index>` and runs its `init`.
    pub fn add_descriptor(
        &mut self,
        characteristic: CharacteristicId,
        index: u16,
        uuid: impl Into<Uuid>,
        flags: Flags,
        handler: impl DescriptorHandler + 'static,
    ) -> TreeResult<DescriptorId> {
        let uuid = uuid.into();
        let path = self
            .characteristics
            .get(characteristic.0)
            .ok_or(TreeError::UnknownOwner)?
            .path
            .child("desc", index);
        let id = DescriptorId(self.descriptors.len());
        self.claim(&path, NodeRef::Descriptor(id))?;

        info!(%path, %uuid, flags = ?flags.tokens(), "registered descriptor");
        self.descriptors.push(DescriptorNode {
            path,
            uuid,
            flags,
            characteristic,
            value: Vec::new(),
            handler: Box::new(handler),
        });
        self.characteristics[characteristic.0].descriptors.push(id);

        self.with_descriptor(id, |handler, ctx| handler.init(ctx));
        Ok(id)
    }

    fn with_characteristic<T>(
        &mut self,
        id: CharacteristicId,
        f: impl FnOnce(&mut dyn CharacteristicHandler, &mut CharacteristicContext<'_>) -> T,
    ) -> T {
        let node = &mut self.characteristics[id.0];
        let mut ctx = CharacteristicContext {
            path: &node.path,
            flags: node.flags,
            value: &mut node.value,
            subscribed: &mut node.subscribed,
            signals: &mut self.signals,
        };
        f(node.handler.as_mut(), &mut ctx)
    }

    fn with_descriptor<T>(
        &mut self,
        id: DescriptorId,
        f: impl FnOnce(&mut dyn DescriptorHandler, &mut DescriptorContext<'_>) -> T,
    ) -> T {
        let owner_flags = self.characteristics[self.descriptors[id.0].characteristic.0].flags;
        let node = &mut self.descriptors[id.0];
        let mut ctx = DescriptorContext {
            path: &node.path,
            flags: node.flags,
            owner_flags,
            value: &mut node.value,
        };
        f(node.handler.as_mut(), &mut ctx)
    }

    fn lookup(&self, path: &ObjectPath) -> GattResult<NodeRef> {
        self.index
            .get(path)
            .copied()
            .ok_or_else(|| GattError::UnknownObject(path.clone()))
    }

    fn check_policy(&self, flags: Flags, access: Access) -> GattResult<()> {
        if self.policy == DispatchPolicy::Enforced && !flags.permits(access) {
            return Err(match access {
                Access::Notify => GattError::NotSupported,
                Access::Read | Access::Write => GattError::NotPermitted,
            });
        }
        Ok(())
    }

    // --- Introspection ---

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn characteristic_count(&self) -> usize {
        self.characteristics.len()
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// `None` for an id issued by another tree.
    pub fn service_path(&self, id: ServiceId) -> Option<&ObjectPath> {
        self.services.get(id.0).map(|node| &node.path)
    }

    pub fn characteristic_path(&self, id: CharacteristicId) -> Option<&ObjectPath> {
        self.characteristics.get(id.0).map(|node| &node.path)
    }

    pub fn descriptor_path(&self, id: DescriptorId) -> Option<&ObjectPath> {
        self.descriptors.get(id.0).map(|node| &node.path)
    }

    /// Last stored value of a characteristic or descriptor
    pub fn stored_value(&self, path: &ObjectPath) -> GattResult<&[u8]> {
        match self.lookup(path)? {
            NodeRef::Characteristic(id) => Ok(self.characteristics[id.0].value.as_slice()),
            NodeRef::Descriptor(id) => Ok(self.descriptors[id.0].value.as_slice()),
            NodeRef::Service(_) => Err(GattError::NotSupported),
        }
    }

    pub fn notify_state(&self, path: &ObjectPath) -> GattResult<NotifyState> {
        match self.lookup(path)? {
            NodeRef::Characteristic(id) if self.characteristics[id.0].subscribed => {
                Ok(NotifyState::Active)
            }
            NodeRef::Characteristic(_) => Ok(NotifyState::Idle),
            _ => Err(GattError::NotSupported),
        }
    }

    fn service_properties(&self, node: &ServiceNode) -> InterfaceProperties {
        let mut props = Properties::new();
        props.insert("UUID".into(), PropertyValue::Uuid(node.uuid));
        props.insert("Primary".into(), PropertyValue::Bool(node.primary));
        props.insert(
            "Characteristics".into(),
            PropertyValue::Paths(
                node.characteristics
                    .iter()
                    .map(|id| self.characteristics[id.0].path.clone())
                    .collect(),
            ),
        );
        let mut ifaces = InterfaceProperties::new();
        ifaces.insert(GATT_SERVICE_IFACE.into(), props);
        ifaces
    }

    fn characteristic_properties(&self, node: &CharacteristicNode) -> InterfaceProperties {
        let mut props = Properties::new();
        props.insert(
            "Service".into(),
            PropertyValue::Path(self.services[node.service.0].path.clone()),
        );
        props.insert("UUID".into(), PropertyValue::Uuid(node.uuid));
        props.insert("Flags".into(), PropertyValue::Flags(node.flags));
        props.insert(
            "Descriptors".into(),
            PropertyValue::Paths(
                node.descriptors
                    .iter()
                    .map(|id| self.descriptors[id.0].path.clone())
                    .collect(),
            ),
        );
        props.insert("Value".into(), PropertyValue::Bytes(node.value.clone()));
        if node.flags.permits(Access::Notify) {
            props.insert("Notifying".into(), PropertyValue::Bool(node.subscribed));
        }
        let mut ifaces = InterfaceProperties::new();
        ifaces.insert(GATT_CHRC_IFACE.into(), props);
        ifaces
    }

    fn descriptor_properties(&self, node: &DescriptorNode) -> InterfaceProperties {
        let mut props = Properties::new();
        props.insert(
            "Characteristic".into(),
            PropertyValue::Path(self.characteristics[node.characteristic.0].path.clone()),
        );
        props.insert("UUID".into(), PropertyValue::Uuid(node.uuid));
        props.insert("Flags".into(), PropertyValue::Flags(node.flags));
        props.insert("Value".into(), PropertyValue::Bytes(node.value.clone()));
        let mut ifaces = InterfaceProperties::new();
        ifaces.insert(GATT_DESC_IFACE.into(), props);
        ifaces
    }

    /// Interface name -> exposed attributes of the node at `path`
    pub fn get_properties(&self, path: &ObjectPath) -> GattResult<InterfaceProperties> {
        Ok(match self.lookup(path)? {
            NodeRef::Service(id) => self.service_properties(&self.services[id.0]),
            NodeRef::Characteristic(id) => {
                self.characteristic_properties(&self.characteristics[id.0])
            }
            NodeRef::Descriptor(id) => self.descriptor_properties(&self.descriptors[id.0]),
        })
    }

    /// `org.freedesktop.DBus.Properties.GetAll`
    pub fn get_all(&self, path: &ObjectPath, interface: &str) -> GattResult<Properties> {
        self.get_properties(path)?
            .swap_remove(interface)
            .ok_or(GattError::InvalidArgs)
    }

    /// `org.freedesktop.DBus.ObjectManager.GetManagedObjects`
    ///
    /// Depth first: each service, then its characteristics, each followed
    /// by its descriptors, all in the order they were added.
    pub fn get_managed_objects(&self) -> ManagedObjects {
        let mut objects = ManagedObjects::new();
        for service in &self.services {
            objects.insert(service.path.clone(), self.service_properties(service));
            for chrc_id in &service.characteristics {
                let chrc = &self.characteristics[chrc_id.0];
                objects.insert(chrc.path.clone(), self.characteristic_properties(chrc));
                for desc_id in &chrc.descriptors {
                    let desc = &self.descriptors[desc_id.0];
                    objects.insert(desc.path.clone(), self.descriptor_properties(desc));
                }
            }
        }
        objects
    }

    // --- Dispatch ---

    pub fn read_value(&mut self, path: &ObjectPath, options: &Options) -> GattResult<Vec<u8>> {
        match self.lookup(path)? {
            NodeRef::Characteristic(id) => {
                self.check_policy(self.characteristics[id.0].flags, Access::Read)?;
                self.with_characteristic(id, |handler, ctx| handler.read_value(ctx, options))
            }
            NodeRef::Descriptor(id) => {
                self.check_policy(self.descriptors[id.0].flags, Access::Read)?;
                self.with_descriptor(id, |handler, ctx| handler.read_value(ctx, options))
            }
            NodeRef::Service(_) => Err(GattError::NotSupported),
        }
    }

    pub fn write_value(
        &mut self,
        path: &ObjectPath,
        value: &[u8],
        options: &Options,
    ) -> GattResult<()> {
        match self.lookup(path)? {
            NodeRef::Characteristic(id) => {
                self.check_policy(self.characteristics[id.0].flags, Access::Write)?;
                self.with_characteristic(id, |handler, ctx| {
                    handler.write_value(ctx, value, options)
                })
            }
            NodeRef::Descriptor(id) => {
                self.check_policy(self.descriptors[id.0].flags, Access::Write)?;
                self.with_descriptor(id, |handler, ctx| handler.write_value(ctx, value, options))
            }
            NodeRef::Service(_) => Err(GattError::NotSupported),
        }
    }

    pub fn start_notify(&mut self, path: &ObjectPath) -> GattResult<()> {
        match self.lookup(path)? {
            NodeRef::Characteristic(id) => {
                self.check_policy(self.characteristics[id.0].flags, Access::Notify)?;
                self.with_characteristic(id, |handler, ctx| handler.start_notify(ctx))
            }
            _ => Err(GattError::NotSupported),
        }
    }

    pub fn stop_notify(&mut self, path: &ObjectPath) -> GattResult<()> {
        match self.lookup(path)? {
            NodeRef::Characteristic(id) => {
                self.check_policy(self.characteristics[id.0].flags, Access::Notify)?;
                self.with_characteristic(id, |handler, ctx| handler.stop_notify(ctx))
            }
            _ => Err(GattError::NotSupported),
        }
    }

    /// Characteristics that own a sampling timer, with their periods
    pub fn pollers(&self) -> Vec<(CharacteristicId, Duration)> {
        self.characteristics
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                node.handler
                    .poll_interval()
                    .map(|period| (CharacteristicId(i), period))
            })
            .collect()
    }

    /// Runs one timer tick of `id`.
    pub fn tick(&mut self, id: CharacteristicId) {
        if id.0 >= self.characteristics.len() {
            return;
        }
        debug!(path = %self.characteristics[id.0].path, "poll tick");
        self.with_characteristic(id, |handler, ctx| handler.poll(ctx));
    }

    /// Drains the property changes queued by the last operations.
    pub fn take_signals(&mut self) -> Vec<PropertiesChanged> {
        std::mem::take(&mut self.signals)
    }
}
