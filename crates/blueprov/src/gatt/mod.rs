//! GATT application object model
//!
//! An application is a tree of services, characteristics and descriptors
//! rooted at `/`. The attribute-protocol manager enumerates it with
//! `GetManagedObjects` and dispatches peer operations to individual nodes.

pub mod node;
pub mod server;
pub mod tree;
pub mod types;

#[cfg(test)]
mod tests;

pub use node::{
    CharacteristicContext, CharacteristicHandler, DescriptorContext, DescriptorHandler,
    NotifyState,
};
pub use server::{GattServer, ServerHandle, SignalSink};
pub use tree::{AttributeTree, CharacteristicId, DescriptorId, ServiceId, TreeError, TreeResult};
pub use types::{
    Access, Flags, InterfaceProperties, ManagedObjects, ObjectPath, Options, Properties,
    PropertiesChanged, PropertyValue, DBUS_OM_IFACE, DBUS_PROP_IFACE, GATT_CHRC_IFACE,
    GATT_DESC_IFACE, GATT_SERVICE_IFACE,
};
