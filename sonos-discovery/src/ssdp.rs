//! SSDP M-SEARCH over UDP multicast.
//!
//! Internal to the crate: sends one search for ZonePlayer devices and collects
//! every answer that arrives before the socket read timeout fires.

use std::collections::HashMap;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{DiscoveryError, Result};

const MULTICAST_ADDR: &str = "239.255.255.250:1900";
pub(crate) const ZONE_PLAYER_TARGET: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";

/// The headers of one SSDP answer that discovery cares about
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub search_target: String,
    pub usn: String,
    pub server: Option<String>,
}

impl SsdpResponse {
    /// Cheap pre-filter before fetching the device description
    pub fn looks_like_sonos(&self) -> bool {
        self.search_target.contains("ZonePlayer")
            || self.usn.contains("RINCON")
            || self
                .server
                .as_deref()
                .map(|s| s.to_ascii_lowercase().contains("sonos"))
                .unwrap_or(false)
    }
}

pub(crate) struct SsdpClient {
    socket: UdpSocket,
    timeout: Duration,
}

impl SsdpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to bind UDP socket: {}", e)))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set read timeout: {}", e)))?;
        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to set multicast loop: {}", e)))?;
        Ok(Self { socket, timeout })
    }

    /// Send an M-SEARCH and collect answers until `timeout` has elapsed
    pub fn search(&self, search_target: &str) -> Result<Vec<SsdpResponse>> {
        let request = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: 1\r\n\
             ST: {}\r\n\
             USER-AGENT: sonos-neuron/1.0 UPnP/1.0\r\n\
             \r\n",
            MULTICAST_ADDR, search_target
        );
        self.socket
            .send_to(request.as_bytes(), MULTICAST_ADDR)
            .map_err(|e| DiscoveryError::NetworkError(format!("Failed to send M-SEARCH: {}", e)))?;

        let deadline = Instant::now() + self.timeout;
        let mut buffer = [0u8; 2048];
        let mut responses = Vec::new();

        while Instant::now() < deadline {
            match self.socket.recv_from(&mut buffer) {
                Ok((size, from)) => {
                    let Ok(text) = std::str::from_utf8(&buffer[..size]) else {
                        continue;
                    };
                    match parse_response(text) {
                        Some(response) => responses.push(response),
                        None => debug!(%from, "ignoring malformed SSDP answer"),
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => return Err(DiscoveryError::NetworkError(format!("Socket error: {}", e))),
            }
        }

        Ok(responses)
    }
}

fn parse_response(text: &str) -> Option<SsdpResponse> {
    let mut lines = text.lines();
    if !lines.next()?.starts_with("HTTP/1.1 200") {
        return None;
    }

    let headers: HashMap<String, String> = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_ascii_uppercase(), value.trim().to_string()))
        })
        .collect();

    Some(SsdpResponse {
        location: headers.get("LOCATION")?.clone(),
        search_target: headers.get("ST")?.clone(),
        usn: headers.get("USN")?.clone(),
        server: headers.get("SERVER").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SONOS_ANSWER: &str = "HTTP/1.1 200 OK\r\n\
        CACHE-CONTROL: max-age = 1800\r\n\
        EXT:\r\n\
        LOCATION: http://192.168.1.100:1400/xml/device_description.xml\r\n\
        SERVER: Linux UPnP/1.0 Sonos/70.3-88200 (ZPS9)\r\n\
        ST: urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
        USN: uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1\r\n\
        \r\n";

    #[test]
    fn test_parse_sonos_answer() {
        let parsed = parse_response(SONOS_ANSWER).unwrap();
        assert_eq!(parsed.location, "http://192.168.1.100:1400/xml/device_description.xml");
        assert_eq!(parsed.search_target, ZONE_PLAYER_TARGET);
        assert_eq!(
            parsed.usn,
            "uuid:RINCON_000E58A0123456::urn:schemas-upnp-org:device:ZonePlayer:1"
        );
        assert_eq!(parsed.server.as_deref(), Some("Linux UPnP/1.0 Sonos/70.3-88200 (ZPS9)"));
        assert!(parsed.looks_like_sonos());
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let answer = "HTTP/1.1 200 OK\r\n\
            location: http://10.0.0.5:1400/xml/device_description.xml\r\n\
            st: upnp:rootdevice\r\n\
            usn: uuid:RINCON_ABC::upnp:rootdevice\r\n\r\n";
        let parsed = parse_response(answer).unwrap();
        assert_eq!(parsed.location, "http://10.0.0.5:1400/xml/device_description.xml");
        assert_eq!(parsed.server, None);
        assert!(parsed.looks_like_sonos());
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_http("NOTIFY * HTTP/1.1\r\nLOCATION: http://x\r\nST: a\r\nUSN: b\r\n\r\n")]
    #[case::missing_location("HTTP/1.1 200 OK\r\nST: a\r\nUSN: b\r\n\r\n")]
    #[case::missing_usn("HTTP/1.1 200 OK\r\nLOCATION: http://x\r\nST: a\r\n\r\n")]
    fn test_rejects_incomplete_answers(#[case] answer: &str) {
        assert!(parse_response(answer).is_none());
    }

    #[test]
    fn test_router_is_not_sonos() {
        let response = SsdpResponse {
            location: "http://192.168.1.1:5000/rootDesc.xml".to_string(),
            search_target: "upnp:rootdevice".to_string(),
            usn: "uuid:router::upnp:rootdevice".to_string(),
            server: Some("Linux/4.4 UPnP/1.0 MiniUPnPd/2.1".to_string()),
        };
        assert!(!response.looks_like_sonos());
    }
}
