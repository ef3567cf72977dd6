//! Wireless configuration characteristic
//!
//! The peer writes `ssid=<s>&psk=<s>`, byte for byte a URL query string.
//! Every existing WiFi connection is removed, then a new one is created if
//! both credentials are present. A payload that is not UTF-8 text is
//! rejected before anything is removed.

use crate::error::{GattError, GattResult};
use crate::gatt::{Access, CharacteristicContext, CharacteristicHandler, Options};
use crate::network::{add_wireless_connection, wireless_connections, NetworkConfig};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use url::form_urlencoded;

/// `a=1&b=2` -> `[("a", "1"), ("b", "2")]`.
///
/// Decoding follows `application/x-www-form-urlencoded`; escapes that do not
/// form valid UTF-8 decode to U+FFFD. Fields whose value is empty are
/// skipped, which makes `ssid=` equivalent to leaving `ssid` out.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

/// WiFi credentials carried by a configuration write
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub psk: String,
}

impl Credentials {
    /// Extracts the first `ssid` and `psk`; a missing key is an empty string.
    pub fn decode(payload: &[u8]) -> GattResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|_| GattError::InvalidArgs)?;
        let pairs = parse_query(text);
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        };
        Ok(Self {
            ssid: first("ssid"),
            psk: first("psk"),
        })
    }

    pub fn is_complete(&self) -> bool {
        !self.ssid.is_empty() && !self.psk.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("psk", &"<redacted>")
            .finish()
    }
}

pub struct WirelessConfigurationCharacteristic {
    network: Arc<dyn NetworkConfig>,
}

impl WirelessConfigurationCharacteristic {
    pub fn new(network: Arc<dyn NetworkConfig>) -> Self {
        Self { network }
    }

    fn apply(&self, credentials: &Credentials) -> GattResult<()> {
        let network = self.network.as_ref();

        for connection in wireless_connections(network)? {
            let uuid = connection
                .uuid()
                .ok_or_else(|| GattError::Failed("wireless connection without uuid".into()))?;
            info!(%uuid, id = %connection.lookup("connection.id"), "deleting wireless connection");
            network.delete_connection(&uuid)?;
        }

        if credentials.is_complete() {
            let uuid = add_wireless_connection(network, &credentials.ssid, &credentials.psk)?;
            info!(ssid = %credentials.ssid, %uuid, "created wireless connection");
        } else {
            info!("incomplete credentials, no wireless connection created");
        }
        Ok(())
    }
}

impl CharacteristicHandler for WirelessConfigurationCharacteristic {
    fn init(&mut self, ctx: &mut CharacteristicContext<'_>) {
        info!(path = %ctx.path(), "initialize NM network configuration characteristic");
    }

    fn write_value(
        &mut self,
        ctx: &mut CharacteristicContext<'_>,
        value: &[u8],
        _options: &Options,
    ) -> GattResult<()> {
        ctx.require(Access::Write)?;
        info!(path = %ctx.path(), "write value to network wireless configuration");

        let credentials = Credentials::decode(value).map_err(|e| {
            warn!(path = %ctx.path(), "malformed wireless configuration payload");
            e
        })?;
        self.apply(&credentials)
    }
}
