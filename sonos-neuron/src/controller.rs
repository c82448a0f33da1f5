//! The device operations the neuron needs, behind one trait.
//!
//! [`UpnpController`] talks to real speakers through `sonos-discovery` and
//! `sonos-api`. Tests substitute a recording implementation.

use std::net::Ipv4Addr;
use std::time::Duration;

use sonos_api::{ApiError, Favorite, SonosClient, ZoneGroup};
use sonos_discovery::DiscoveryError;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a single device operation
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The topology did not contain what it should have
    #[error("{0}")]
    Topology(String),
}

impl ControlError {
    /// Short name of the error class, e.g. `Timeout`
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::Api(e) => e.kind(),
            ControlError::Discovery(e) => e.kind(),
            ControlError::Topology(_) => "Topology",
        }
    }
}

pub type ControlResult<T> = std::result::Result<T, ControlError>;

/// A speaker as the neuron sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// `RINCON_...` identifier
    pub uid: String,
    /// Zone name
    pub name: String,
    pub ip: String,
    pub port: u16,
    /// Bonded satellites and subwoofers are invisible
    pub visible: bool,
    /// UID of the coordinator of the device's group; its own UID when standalone
    pub coordinator_uid: String,
}

impl Device {
    /// `ip:port`, as used for SOAP calls
    pub fn host(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub fn is_coordinator(&self) -> bool {
        self.uid == self.coordinator_uid
    }
}

/// Speakers playing in sync, as listed in the household topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub coordinator_uid: String,
    pub members: Vec<Device>,
}

impl Group {
    pub fn coordinator(&self) -> Option<&Device> {
        self.members.iter().find(|member| member.uid == self.coordinator_uid)
    }

    pub fn member(&self, uid: &str) -> Option<&Device> {
        self.members.iter().find(|member| member.uid == uid)
    }
}

/// Operations on speakers used by the neuron's actions
///
/// Every call is blocking and is never retried; the caller decides whether a
/// failure is fatal.
pub trait Controller {
    /// Find the speaker whose zone name is `name`
    fn discover(&self, name: &str) -> ControlResult<Option<Device>>;

    /// Describe the speaker at `ip`
    fn connect(&self, ip: Ipv4Addr) -> ControlResult<Device>;

    /// Household topology as seen by `target`
    fn zone_groups(&self, target: &Device) -> ControlResult<Vec<Group>>;

    /// Sonos favorites, in catalog order
    fn favorites(&self, target: &Device) -> ControlResult<Vec<Favorite>>;

    fn play(&self, device: &Device) -> ControlResult<()>;

    fn pause(&self, device: &Device) -> ControlResult<()>;

    fn next(&self, device: &Device) -> ControlResult<()>;

    fn previous(&self, device: &Device) -> ControlResult<()>;

    fn set_mute(&self, device: &Device, mute: bool) -> ControlResult<()>;

    fn clear_queue(&self, device: &Device) -> ControlResult<()>;

    fn add_to_queue(&self, device: &Device, favorite: &Favorite) -> ControlResult<()>;

    /// Start playing the queue at `index` (0-based)
    fn play_from_queue(&self, device: &Device, index: u32) -> ControlResult<()>;

    /// Leave the current group
    fn unjoin(&self, device: &Device) -> ControlResult<()>;

    /// Follow `coordinator`'s group
    fn join(&self, device: &Device, coordinator: &Device) -> ControlResult<()>;
}

/// [`Controller`] for real speakers on the local network
#[derive(Debug, Clone)]
pub struct UpnpController {
    client: SonosClient,
    discovery_timeout: Duration,
}

impl UpnpController {
    pub fn new(discovery_timeout: Duration) -> Self {
        Self::with_client(SonosClient::new(), discovery_timeout)
    }

    pub fn with_client(client: SonosClient, discovery_timeout: Duration) -> Self {
        Self {
            client,
            discovery_timeout,
        }
    }
}

impl Default for UpnpController {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

/// A discovered speaker counts as a standalone zone until the topology says otherwise
fn from_discovered(device: sonos_discovery::Device) -> Device {
    let uid = device.uid().to_string();
    Device {
        coordinator_uid: uid.clone(),
        uid,
        name: device.name,
        ip: device.ip_address,
        port: device.port,
        visible: true,
    }
}

/// Resolve every member of a topology group; any unusable member fails the group
fn group_from_topology(group: &ZoneGroup) -> ControlResult<Group> {
    let members = group
        .members
        .iter()
        .map(|member| -> ControlResult<Device> {
            let (ip, port) = member.address()?;
            Ok(Device {
                uid: member.uuid.clone(),
                name: member.zone_name.clone(),
                ip,
                port,
                visible: member.is_visible(),
                coordinator_uid: group.coordinator.clone(),
            })
        })
        .collect::<ControlResult<Vec<_>>>()?;

    Ok(Group {
        coordinator_uid: group.coordinator.clone(),
        members,
    })
}

impl Controller for UpnpController {
    fn discover(&self, name: &str) -> ControlResult<Option<Device>> {
        debug!(name, timeout = ?self.discovery_timeout, "discovering speaker by name");
        Ok(sonos_discovery::find_by_name(name, self.discovery_timeout).map(from_discovered))
    }

    fn connect(&self, ip: Ipv4Addr) -> ControlResult<Device> {
        let device = sonos_discovery::describe(&ip.to_string(), sonos_discovery::SONOS_PORT, self.discovery_timeout)?;
        Ok(from_discovered(device))
    }

    fn zone_groups(&self, target: &Device) -> ControlResult<Vec<Group>> {
        let groups = self.client.zone_groups(&target.host())?;
        Ok(groups
            .iter()
            .filter_map(|group| match group_from_topology(group) {
                Ok(group) => Some(group),
                Err(e) => {
                    warn!("failed to add group '{}' to rooms: {}", group.coordinator, e);
                    None
                }
            })
            .collect())
    }

    fn favorites(&self, target: &Device) -> ControlResult<Vec<Favorite>> {
        Ok(self.client.favorites(&target.host())?)
    }

    fn play(&self, device: &Device) -> ControlResult<()> {
        Ok(self.client.play(&device.host())?)
    }

    fn pause(&self, device: &Device) -> ControlResult<()> {
        Ok(self.client.pause(&device.host())?)
    }

    fn next(&self, device: &Device) -> ControlResult<()> {
        Ok(self.client.next(&device.host())?)
    }

    fn previous(&self, device: &Device) -> ControlResult<()> {
        Ok(self.client.previous(&device.host())?)
    }

    fn set_mute(&self, device: &Device, mute: bool) -> ControlResult<()> {
        Ok(self.client.set_mute(&device.host(), mute)?)
    }

    fn clear_queue(&self, device: &Device) -> ControlResult<()> {
        Ok(self.client.clear_queue(&device.host())?)
    }

    fn add_to_queue(&self, device: &Device, favorite: &Favorite) -> ControlResult<()> {
        let added = self
            .client
            .add_to_queue(&device.host(), &favorite.uri, &favorite.metadata)?;
        debug!(
            favorite = %favorite.title,
            tracks = added.num_tracks_added,
            queue_length = added.new_queue_length,
            "enqueued favorite"
        );
        Ok(())
    }

    fn play_from_queue(&self, device: &Device, index: u32) -> ControlResult<()> {
        Ok(self.client.play_from_queue(&device.host(), &device.uid, index)?)
    }

    fn unjoin(&self, device: &Device) -> ControlResult<()> {
        Ok(self.client.unjoin(&device.host())?)
    }

    fn join(&self, device: &Device, coordinator: &Device) -> ControlResult<()> {
        Ok(self.client.join(&device.host(), &coordinator.uid)?)
    }
}
