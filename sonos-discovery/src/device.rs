//! Device description parsing.
//!
//! Sonos speakers publish a UPnP description at
//! `http://<ip>:1400/xml/device_description.xml`; this module turns it into a
//! [`Device`].

use serde::Deserialize;

use crate::error::{DiscoveryError, Result};
use crate::Device;

#[derive(Debug, Deserialize)]
struct Root {
    device: DeviceDescription,
}

/// The subset of the UPnP device description Sonos fills in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    #[serde(rename = "UDN")]
    pub udn: String,
    pub room_name: Option<String>,
}

impl DeviceDescription {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root: Root = quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::ParseError(format!("Failed to parse device XML: {}", e)))?;
        Ok(root.device)
    }

    pub fn is_sonos_device(&self) -> bool {
        self.manufacturer.to_lowercase().contains("sonos")
            || self.device_type.contains("ZonePlayer")
    }

    /// Build the public device; the zone name falls back to the friendly name
    pub fn into_device(self, ip_address: String, port: u16) -> Device {
        Device {
            id: self.udn,
            name: self.room_name.unwrap_or(self.friendly_name),
            ip_address,
            port,
            model_name: self.model_name,
        }
    }
}

/// Split `http://192.168.1.100:1400/xml/...` into host and port
pub(crate) fn host_and_port(url: &str) -> Option<(String, u16)> {
    let authority = url.split("//").nth(1)?.split('/').next()?;
    match authority.split_once(':') {
        Some((host, port)) => Some((host.to_string(), port.parse().ok()?)),
        None => Some((authority.to_string(), 80)),
    }
}
