//! Polling status characteristics
//!
//! A [`StatusCharacteristic`] exposes a small fixed-size record read from an
//! external [`StatusSource`]. It re-reads on every `ReadValue`, samples the
//! source on a fixed timer, and pushes the sampled value to a subscribed peer
//! only when the record has the expected length.

use crate::error::GattResult;
use crate::gatt::{Access, CharacteristicContext, CharacteristicHandler, Options};
use std::time::Duration;
use tracing::{debug, info, warn};

/// External state exposed by a status characteristic
pub trait StatusSource: Send {
    /// Label used in logs, e.g. `NM wifi device state`
    fn label(&self) -> String;

    /// Length of a complete record
    fn expected_len(&self) -> usize;

    /// Current record; empty when the backing device is absent.
    fn read(&self) -> GattResult<Vec<u8>>;
}

pub struct StatusCharacteristic<S> {
    source: S,
    interval: Duration,
}

impl<S: StatusSource> StatusCharacteristic<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    fn refresh(&mut self, ctx: &mut CharacteristicContext<'_>) {
        let value = match self.source.read() {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %ctx.path(), error = %e, "failed to sample {}", self.source.label());
                return;
            }
        };
        debug!(path = %ctx.path(), ?value, "sampled {}", self.source.label());
        ctx.set_value(value);

        if ctx.is_subscribed() && ctx.value().len() == self.source.expected_len() {
            ctx.push_value();
        }
    }
}

impl<S: StatusSource> CharacteristicHandler for StatusCharacteristic<S> {
    fn init(&mut self, ctx: &mut CharacteristicContext<'_>) {
        info!(path = %ctx.path(), "initialize {} characteristic", self.source.label());
        match self.source.read() {
            Ok(value) => ctx.set_value(value),
            Err(e) => warn!(path = %ctx.path(), error = %e, "initial read failed"),
        }
    }

    fn read_value(
        &mut self,
        ctx: &mut CharacteristicContext<'_>,
        _options: &Options,
    ) -> GattResult<Vec<u8>> {
        ctx.require(Access::Read)?;
        let value = self.source.read()?;
        ctx.set_value(value.clone());
        info!(path = %ctx.path(), ?value, "read {}", self.source.label());
        Ok(value)
    }

    fn start_notify(&mut self, ctx: &mut CharacteristicContext<'_>) -> GattResult<()> {
        info!(path = %ctx.path(), "start notifying {}", self.source.label());
        if ctx.subscribe()? {
            self.refresh(ctx);
        }
        Ok(())
    }

    fn stop_notify(&mut self, ctx: &mut CharacteristicContext<'_>) -> GattResult<()> {
        info!(path = %ctx.path(), "stop notifying {}", self.source.label());
        ctx.unsubscribe();
        Ok(())
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.interval)
    }

    fn poll(&mut self, ctx: &mut CharacteristicContext<'_>) {
        self.refresh(ctx);
    }
}
