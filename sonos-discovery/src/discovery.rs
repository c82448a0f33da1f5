//! Discovery iterator: SSDP answers in, described [`Device`]s out.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::device::{host_and_port, DeviceDescription};
use crate::error::{DiscoveryError, Result};
use crate::ssdp::{SsdpClient, SsdpResponse, ZONE_PLAYER_TARGET};
use crate::Device;

/// Iterator over the Sonos devices answering one SSDP search.
///
/// The search runs lazily on the first call to `next()`; each yielded device
/// costs one HTTP request for its description. Answers are deduplicated by
/// location, and non-Sonos devices or unreachable descriptions are skipped.
pub struct DiscoveryIterator {
    ssdp_client: Option<SsdpClient>,
    pending: std::vec::IntoIter<SsdpResponse>,
    seen_locations: HashSet<String>,
    http_client: reqwest::blocking::Client,
}

impl DiscoveryIterator {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            ssdp_client: Some(SsdpClient::new(timeout)?),
            pending: Vec::new().into_iter(),
            seen_locations: HashSet::new(),
            http_client: http_client(timeout)?,
        })
    }

    /// An iterator that yields nothing; used when the socket cannot be opened
    pub(crate) fn empty() -> Self {
        Self {
            ssdp_client: None,
            pending: Vec::new().into_iter(),
            seen_locations: HashSet::new(),
            http_client: reqwest::blocking::Client::new(),
        }
    }

    fn run_search(&mut self) {
        if let Some(client) = self.ssdp_client.take() {
            match client.search(ZONE_PLAYER_TARGET) {
                Ok(responses) => {
                    debug!(count = responses.len(), "collected SSDP answers");
                    self.pending = responses.into_iter();
                }
                Err(e) => warn!("SSDP search failed: {}", e),
            }
        }
    }

    fn describe(&self, response: &SsdpResponse) -> Result<Device> {
        let (ip, port) = host_and_port(&response.location).ok_or_else(|| {
            DiscoveryError::ParseError(format!("Bad location URL '{}'", response.location))
        })?;
        fetch_device(&self.http_client, &response.location, ip, port)
    }
}

impl Iterator for DiscoveryIterator {
    type Item = Device;

    fn next(&mut self) -> Option<Self::Item> {
        self.run_search();

        while let Some(response) = self.pending.next() {
            if !self.seen_locations.insert(response.location.clone()) {
                continue;
            }
            if !response.looks_like_sonos() {
                continue;
            }
            match self.describe(&response) {
                Ok(device) => return Some(device),
                Err(e) => debug!(location = %response.location, "skipping device: {}", e),
            }
        }
        None
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DiscoveryError::NetworkError(format!("Failed to create HTTP client: {}", e)))
}

/// Fetch and validate the description served at `location`
pub(crate) fn fetch_device(
    http_client: &reqwest::blocking::Client,
    location: &str,
    ip: String,
    port: u16,
) -> Result<Device> {
    let xml = http_client.get(location).send()?.error_for_status()?.text()?;
    let description = DeviceDescription::from_xml(&xml)?;
    if !description.is_sonos_device() {
        return Err(DiscoveryError::InvalidDevice(format!(
            "{} is a '{}' made by '{}'",
            location, description.device_type, description.manufacturer
        )));
    }
    Ok(description.into_device(ip, port))
}
