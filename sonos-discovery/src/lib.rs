//! Sonos device discovery
//!
//! Finds Sonos speakers on the local network with SSDP and their UPnP device
//! descriptions, or describes a single speaker at a known address.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! for device in sonos_discovery::get_iter_with_timeout(Duration::from_secs(2)) {
//!     println!("Found {} at {}", device.name, device.ip_address);
//! }
//!
//! let kitchen = sonos_discovery::find_by_name("Kitchen", Duration::from_secs(3));
//! ```

mod device;
mod discovery;
mod error;
mod ssdp;

pub use discovery::DiscoveryIterator;
pub use error::{DiscoveryError, Result};

use std::time::Duration;

use tracing::debug;

/// Default port of the Sonos UPnP HTTP server
pub const SONOS_PORT: u16 = 1400;

/// A discovered Sonos speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Unique device name (UDN), e.g. `uuid:RINCON_000E58A0123456`
    pub id: String,
    /// Zone name shown in the Sonos app, e.g. `Kitchen`
    pub name: String,
    pub ip_address: String,
    pub port: u16,
    /// Model name, e.g. `Sonos One`
    pub model_name: String,
}

impl Device {
    /// The `RINCON_...` identifier without the `uuid:` prefix
    pub fn uid(&self) -> &str {
        self.id.strip_prefix("uuid:").unwrap_or(&self.id)
    }
}

/// Lazily discover Sonos devices; stops early when the caller stops iterating.
pub fn get_iter_with_timeout(timeout: Duration) -> DiscoveryIterator {
    DiscoveryIterator::new(timeout).unwrap_or_else(|e| {
        debug!("discovery unavailable: {}", e);
        DiscoveryIterator::empty()
    })
}

/// Discover the speaker whose zone name is exactly `name`.
///
/// Iteration stops at the first match, so a hit usually costs a single
/// description fetch.
pub fn find_by_name(name: &str, timeout: Duration) -> Option<Device> {
    get_iter_with_timeout(timeout).find(|device| device.name == name)
}

/// Describe the speaker at `ip:port` without any multicast traffic.
///
/// # Errors
///
/// `Timeout` or `NetworkError` when the speaker cannot be reached,
/// `InvalidDevice` when something other than a Sonos player answers.
pub fn describe(ip: &str, port: u16, timeout: Duration) -> Result<Device> {
    let location = format!("http://{}:{}/xml/device_description.xml", ip, port);
    let client = discovery::http_client(timeout)?;
    discovery::fetch_device(&client, &location, ip.to_string(), port)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVING_ROOM_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:ZonePlayer:1</deviceType>
    <friendlyName>127.0.0.1 - Sonos Five</friendlyName>
    <manufacturer>Sonos, Inc.</manufacturer>
    <modelName>Sonos Five</modelName>
    <UDN>uuid:RINCON_5E5E5E5E5E5E01400</UDN>
    <roomName>Living Room</roomName>
  </device>
</root>"#;

    fn split_host(server: &mockito::Server) -> (String, u16) {
        let host_with_port = server.host_with_port();
        let (host, port) = host_with_port.split_once(':').unwrap();
        (host.to_string(), port.parse().unwrap())
    }

    #[test]
    fn test_uid_strips_uuid_prefix() {
        let device = Device {
            id: "uuid:RINCON_111".to_string(),
            name: "Kitchen".to_string(),
            ip_address: "192.168.1.10".to_string(),
            port: SONOS_PORT,
            model_name: "Sonos One".to_string(),
        };
        assert_eq!(device.uid(), "RINCON_111");

        let bare = Device { id: "RINCON_222".to_string(), ..device };
        assert_eq!(bare.uid(), "RINCON_222");
    }

    #[test]
    fn test_describe_reads_device_description() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/xml/device_description.xml")
            .with_status(200)
            .with_body(LIVING_ROOM_XML)
            .create();

        let (host, port) = split_host(&server);
        let device = describe(&host, port, Duration::from_secs(2)).unwrap();

        assert_eq!(device.name, "Living Room");
        assert_eq!(device.uid(), "RINCON_5E5E5E5E5E5E01400");
        assert_eq!(device.port, port);
        mock.assert();
    }

    #[test]
    fn test_describe_rejects_non_sonos() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/xml/device_description.xml")
            .with_status(200)
            .with_body(
                r#"<root><device><deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
                <friendlyName>NAS</friendlyName><manufacturer>Acme</manufacturer>
                <modelName>Box</modelName><UDN>uuid:nas</UDN></device></root>"#,
            )
            .create();

        let (host, port) = split_host(&server);
        let err = describe(&host, port, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidDevice(_)));
    }

    #[test]
    fn test_describe_http_error_is_network_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/xml/device_description.xml")
            .with_status(404)
            .create();

        let (host, port) = split_host(&server);
        let err = describe(&host, port, Duration::from_secs(2)).unwrap_err();
        assert_eq!(err.kind(), "NetworkError");
    }

    #[test]
    fn test_empty_iterator_yields_nothing() {
        assert_eq!(DiscoveryIterator::empty().count(), 0);
    }
}
