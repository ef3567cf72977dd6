//! Dispatch contract for characteristics and descriptors
//!
//! Every operation defaults to `NotSupported`. A concrete node overrides the
//! operations it implements and is expected to check its own flags with
//! [`CharacteristicContext::require`] / [`DescriptorContext::require`].

use super::types::{Access, Flags, ObjectPath, Options, PropertiesChanged};
use crate::error::{GattError, GattResult};
use std::time::Duration;
use tracing::error;

/// Subscription state of a characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyState {
    Idle,
    Active,
}

/// Mutable view of one characteristic handed to its handler
pub struct CharacteristicContext<'a> {
    pub(crate) path: &'a ObjectPath,
    pub(crate) flags: Flags,
    pub(crate) value: &'a mut Vec<u8>,
    pub(crate) subscribed: &'a mut bool,
    pub(crate) signals: &'a mut Vec<PropertiesChanged>,
}

impl<'a> CharacteristicContext<'a> {
    pub fn path(&self) -> &ObjectPath {
        self.path
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn value(&self) -> &[u8] {
        self.value
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        *self.value = value;
    }

    /// Fails with `NotPermitted` unless the declared flags allow `access`.
    pub fn require(&self, access: Access) -> GattResult<()> {
        if self.flags.permits(access) {
            Ok(())
        } else {
            Err(GattError::NotPermitted)
        }
    }

    pub fn is_subscribed(&self) -> bool {
        *self.subscribed
    }

    pub fn notify_state(&self) -> NotifyState {
        if *self.subscribed {
            NotifyState::Active
        } else {
            NotifyState::Idle
        }
    }

    /// `Idle -> Active`. Returns whether the state changed.
    pub fn subscribe(&mut self) -> GattResult<bool> {
        if !self.flags.permits(Access::Notify) {
            return Err(GattError::NotSupported);
        }
        let changed = !*self.subscribed;
        *self.subscribed = true;
        Ok(changed)
    }

    /// `Active -> Idle`. Returns whether the state changed.
    pub fn unsubscribe(&mut self) -> bool {
        let changed = *self.subscribed;
        *self.subscribed = false;
        changed
    }

    /// Queues a `Value` change carrying the current value.
    pub fn push_value(&mut self) {
        self.signals
            .push(PropertiesChanged::value(self.path.clone(), self.value.clone()));
    }
}

/// Mutable view of one descriptor handed to its handler
pub struct DescriptorContext<'a> {
    pub(crate) path: &'a ObjectPath,
    pub(crate) flags: Flags,
    pub(crate) owner_flags: Flags,
    pub(crate) value: &'a mut Vec<u8>,
}

impl<'a> DescriptorContext<'a> {
    pub fn path(&self) -> &ObjectPath {
        self.path
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Flags of the owning characteristic
    pub fn owner_flags(&self) -> Flags {
        self.owner_flags
    }

    pub fn value(&self) -> &[u8] {
        self.value
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        *self.value = value;
    }

    pub fn require(&self, access: Access) -> GattResult<()> {
        if self.flags.permits(access) {
            Ok(())
        } else {
            Err(GattError::NotPermitted)
        }
    }
}

/// Behavior behind a characteristic node
pub trait CharacteristicHandler: Send {
    /// Called once when the node is added to the tree.
    fn init(&mut self, _ctx: &mut CharacteristicContext<'_>) {}

    fn read_value(
        &mut self,
        ctx: &mut CharacteristicContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        error!(path = %ctx.path(), "Default ReadValue called, returning error");
        Err(GattError::NotSupported)
    }

    fn write_value(
        &mut self,
        ctx: &mut CharacteristicContext<'_>,
        _value: &[u8],
        _options: &Options,
    ) -> GattResult<()> {
        error!(path = %ctx.path(), "Default WriteValue called, returning error");
        Err(GattError::NotSupported)
    }

    fn start_notify(&mut self, ctx: &mut CharacteristicContext<'_>) -> GattResult<()> {
        error!(path = %ctx.path(), "Default StartNotify called, returning error");
        Err(GattError::NotSupported)
    }

    fn stop_notify(&mut self, ctx: &mut CharacteristicContext<'_>) -> GattResult<()> {
        error!(path = %ctx.path(), "Default StopNotify called, returning error");
        Err(GattError::NotSupported)
    }

    /// Period of the sampling timer, if this characteristic polls
    fn poll_interval(&self) -> Option<Duration> {
        None
    }

    /// One timer tick
    fn poll(&mut self, _ctx: &mut CharacteristicContext<'_>) {}
}

/// Behavior behind a descriptor node. Descriptors never notify.
pub trait DescriptorHandler: Send {
    fn init(&mut self, _ctx: &mut DescriptorContext<'_>) {}

    fn read_value(
        &mut self,
        ctx: &mut DescriptorContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        error!(path = %ctx.path(), "Default ReadValue called, returning error");
        Err(GattError::NotSupported)
    }

    fn write_value(
        &mut self,
        ctx: &mut DescriptorContext<'_>,
        _value: &[u8],
        _options: &Options,
    ) -> GattResult<()> {
        error!(path = %ctx.path(), "Default WriteValue called, returning error");
        Err(GattError::NotSupported)
    }
}
