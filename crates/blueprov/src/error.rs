//! Error types for the blueprov library
//!
//! `GattError` is the fault taxonomy surfaced to the remote peer through the
//! attribute-protocol manager. Every fault aborts only the operation that
//! raised it.

use crate::gatt::ObjectPath;
use crate::network::NetworkError;
use thiserror::Error;

/// Faults returned by attribute dispatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GattError {
    #[error("Invalid arguments")]
    InvalidArgs,

    #[error("Operation not supported")]
    NotSupported,

    #[error("Operation not permitted")]
    NotPermitted,

    #[error("Invalid value length")]
    InvalidValueLength,

    #[error("No attribute at {0}")]
    UnknownObject(ObjectPath),

    #[error("Operation failed: {0}")]
    Failed(String),
}

impl GattError {
    /// The protocol-level fault name the manager reports to the peer.
    pub fn fault_name(&self) -> &'static str {
        match self {
            GattError::InvalidArgs => "org.freedesktop.DBus.Error.InvalidArgs",
            GattError::NotSupported => "org.bluez.Error.NotSupported",
            GattError::NotPermitted => "org.bluez.Error.NotPermitted",
            GattError::InvalidValueLength => "org.bluez.Error.InvalidValueLength",
            GattError::UnknownObject(_) => "org.freedesktop.DBus.Error.UnknownObject",
            GattError::Failed(_) => "org.bluez.Error.Failed",
        }
    }
}

impl From<NetworkError> for GattError {
    fn from(err: NetworkError) -> Self {
        GattError::Failed(err.to_string())
    }
}

/// GATT Result type
pub type GattResult<T> = Result<T, GattError>;
