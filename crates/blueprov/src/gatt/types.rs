//! Common types for GATT operations
//!
//! This module defines the object paths, capability flags, property records
//! and request options shared by every node of the attribute tree.

use crate::uuid::Uuid;
use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub const GATT_SERVICE_IFACE: &str = "org.bluez.GattService1";
pub const GATT_CHRC_IFACE: &str = "org.bluez.GattCharacteristic1";
pub const GATT_DESC_IFACE: &str = "org.bluez.GattDescriptor1";
pub const DBUS_PROP_IFACE: &str = "org.freedesktop.DBus.Properties";
pub const DBUS_OM_IFACE: &str = "org.freedesktop.DBus.ObjectManager";

/// Hierarchical identifier of a node in the attribute tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn new(path: impl Into<String>) -> Self {
        ObjectPath(path.into())
    }

    /// The application root, `/`
    pub fn root() -> Self {
        ObjectPath("/".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<self>/<kind><index>`
    pub fn child(&self, kind: &str, index: u16) -> Self {
        if self.0 == "/" {
            ObjectPath(format!("/{}{}", kind, index))
        } else {
            ObjectPath(format!("{}/{}{}", self.0, kind, index))
        }
    }

    /// True when `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &ObjectPath) -> bool {
        if self == ancestor {
            return false;
        }
        if ancestor.0 == "/" {
            return self.0.starts_with('/');
        }
        self.0
            .strip_prefix(ancestor.0.as_str())
            .map_or(false, |rest| rest.starts_with('/'))
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

bitflags! {
    /// Capability tokens declared by a characteristic or descriptor.
    ///
    /// Flags are metadata exposed to the peer. Whether they are also
    /// enforced before a handler runs depends on the tree's dispatch policy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        const BROADCAST = 1 << 0;
        const READ = 1 << 1;
        const WRITE_WITHOUT_RESPONSE = 1 << 2;
        const WRITE = 1 << 3;
        const NOTIFY = 1 << 4;
        const INDICATE = 1 << 5;
        const AUTHENTICATED_SIGNED_WRITES = 1 << 6;
        const EXTENDED_PROPERTIES = 1 << 7;
        const RELIABLE_WRITE = 1 << 8;
        const WRITABLE_AUXILIARIES = 1 << 9;
        const ENCRYPT_READ = 1 << 10;
        const ENCRYPT_WRITE = 1 << 11;
        const ENCRYPT_AUTHENTICATED_READ = 1 << 12;
        const ENCRYPT_AUTHENTICATED_WRITE = 1 << 13;
        const SECURE_READ = 1 << 14;
        const SECURE_WRITE = 1 << 15;
        const AUTHORIZE = 1 << 16;
    }
}

const FLAG_TOKENS: &[(Flags, &str)] = &[
    (Flags::BROADCAST, "broadcast"),
    (Flags::READ, "read"),
    (Flags::WRITE_WITHOUT_RESPONSE, "write-without-response"),
    (Flags::WRITE, "write"),
    (Flags::NOTIFY, "notify"),
    (Flags::INDICATE, "indicate"),
    (Flags::AUTHENTICATED_SIGNED_WRITES, "authenticated-signed-writes"),
    (Flags::EXTENDED_PROPERTIES, "extended-properties"),
    (Flags::RELIABLE_WRITE, "reliable-write"),
    (Flags::WRITABLE_AUXILIARIES, "writable-auxiliaries"),
    (Flags::ENCRYPT_READ, "encrypt-read"),
    (Flags::ENCRYPT_WRITE, "encrypt-write"),
    (Flags::ENCRYPT_AUTHENTICATED_READ, "encrypt-authenticated-read"),
    (Flags::ENCRYPT_AUTHENTICATED_WRITE, "encrypt-authenticated-write"),
    (Flags::SECURE_READ, "secure-read"),
    (Flags::SECURE_WRITE, "secure-write"),
    (Flags::AUTHORIZE, "authorize"),
];

/// The kind of peer operation a flag set may permit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Notify,
}

impl Flags {
    const ANY_READ: Flags = Flags::READ
        .union(Flags::ENCRYPT_READ)
        .union(Flags::ENCRYPT_AUTHENTICATED_READ)
        .union(Flags::SECURE_READ);

    const ANY_WRITE: Flags = Flags::WRITE
        .union(Flags::WRITE_WITHOUT_RESPONSE)
        .union(Flags::AUTHENTICATED_SIGNED_WRITES)
        .union(Flags::RELIABLE_WRITE)
        .union(Flags::ENCRYPT_WRITE)
        .union(Flags::ENCRYPT_AUTHENTICATED_WRITE)
        .union(Flags::SECURE_WRITE);

    const ANY_NOTIFY: Flags = Flags::NOTIFY.union(Flags::INDICATE);

    /// Wire tokens in declaration order, e.g. `["read", "notify"]`.
    pub fn tokens(&self) -> Vec<&'static str> {
        FLAG_TOKENS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, token)| *token)
            .collect()
    }

    /// Parses one wire token.
    pub fn from_token(token: &str) -> Option<Flags> {
        FLAG_TOKENS
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(flag, _)| *flag)
    }

    pub fn permits(&self, access: Access) -> bool {
        match access {
            Access::Read => self.intersects(Self::ANY_READ),
            Access::Write => self.intersects(Self::ANY_WRITE),
            Access::Notify => self.intersects(Self::ANY_NOTIFY),
        }
    }
}

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.tokens())
    }
}

/// A single exposed attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Str(String),
    Uuid(Uuid),
    Path(ObjectPath),
    Paths(Vec<ObjectPath>),
    Flags(Flags),
    Bytes(Vec<u8>),
}

/// Attribute name -> value, for one interface
pub type Properties = IndexMap<String, PropertyValue>;

/// Interface name -> properties, for one node
pub type InterfaceProperties = IndexMap<String, Properties>;

/// Path -> interfaces, for the whole tree, in insertion order
pub type ManagedObjects = IndexMap<ObjectPath, InterfaceProperties>;

/// Property change event pushed to the manager
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesChanged {
    pub path: ObjectPath,
    pub interface: String,
    pub changed: Properties,
    pub invalidated: Vec<String>,
}

impl PropertiesChanged {
    /// A `Value` change on a characteristic
    pub fn value(path: ObjectPath, value: Vec<u8>) -> Self {
        let mut changed = Properties::new();
        changed.insert("Value".into(), PropertyValue::Bytes(value));
        Self {
            path,
            interface: GATT_CHRC_IFACE.into(),
            changed,
            invalidated: Vec::new(),
        }
    }
}

/// Open key-value record accompanying read and write requests.
///
/// Well-known keys have typed accessors; anything else is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, serde_json::Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn offset(&self) -> Option<u16> {
        self.get("offset")
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok())
    }

    pub fn mtu(&self) -> Option<u16> {
        self.get("mtu")
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok())
    }

    /// The peer that issued the request
    pub fn device(&self) -> Option<ObjectPath> {
        self.get("device").and_then(|v| v.as_str()).map(ObjectPath::new)
    }

    pub fn link(&self) -> Option<&str> {
        self.get("link").and_then(|v| v.as_str())
    }

    /// Write type: `command`, `request` or `reliable`
    pub fn write_type(&self) -> Option<&str> {
        self.get("type").and_then(|v| v.as_str())
    }
}
