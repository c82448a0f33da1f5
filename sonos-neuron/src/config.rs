//! Neuron configuration
//!
//! Everything is validated when it is loaded: the address is parsed and must
//! be private, room aliases are normalised to name/member lists. Actions
//! never see raw configuration strings.

use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::action::Invocation;
use crate::error::{ConfigError, NeuronError};

const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 3;

/// What `init` does when the given address is not a visible group coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorPolicy {
    /// Refuse, naming the coordinator's address in the error
    #[default]
    Fail,
    /// Warn and continue with the group's coordinator
    Fallback,
}

impl FromStr for CoordinatorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(CoordinatorPolicy::Fail),
            "fallback" => Ok(CoordinatorPolicy::Fallback),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for CoordinatorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorPolicy::Fail => f.write_str("fail"),
            CoordinatorPolicy::Fallback => f.write_str("fallback"),
        }
    }
}

/// A user-defined room: an alias for one or more zones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredRoom {
    pub name: String,
    /// Zone names; the first one coordinates playback
    pub members: Vec<String>,
}

/// User-defined room aliases
///
/// Accepted shapes, per room: a list of zone names or a single zone name.
/// The whole mapping may also arrive encoded as a string, as some hosts
/// pass nested settings that way.
///
/// ```
/// use sonos_neuron::config::RoomConfig;
/// use serde_json::json;
///
/// let rooms = RoomConfig::from_value(&json!({
///     "Downstairs": ["Living", "Kitchen"],
///     "Office": "Study",
/// }))?;
/// assert_eq!(rooms.len(), 2);
/// # Ok::<(), sonos_neuron::error::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct RoomConfig {
    rooms: Vec<ConfiguredRoom>,
}

impl RoomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room<S: Into<String>>(mut self, name: &str, members: impl IntoIterator<Item = S>) -> Self {
        self.rooms.push(ConfiguredRoom {
            name: name.to_string(),
            members: members.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(encoded) => Self::from_value(&decode_rooms(encoded)?),
            Value::Object(map) => {
                let mut rooms = Vec::with_capacity(map.len());
                for (name, members) in map {
                    match members {
                        Value::Array(list) => rooms.push(ConfiguredRoom {
                            name: name.clone(),
                            members: member_names(name, list),
                        }),
                        Value::String(member) => rooms.push(ConfiguredRoom {
                            name: name.clone(),
                            members: vec![member.clone()],
                        }),
                        other => warn!(
                            "expected config setting 'rooms' to be a list (of rooms) or string (single room), got {} for room '{}'",
                            json_type(other),
                            name
                        ),
                    }
                }
                Ok(Self { rooms })
            }
            other => Err(ConfigError::InvalidRooms(format!(
                "expected a mapping of room names, got {}",
                json_type(other)
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfiguredRoom> {
        self.rooms.iter()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl TryFrom<Value> for RoomConfig {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

fn decode_rooms(encoded: &str) -> Result<Value, ConfigError> {
    if encoded.trim().is_empty() {
        return Ok(Value::Null);
    }
    // JSON5 also covers Python-style reprs, e.g. {'Upstairs': ["Kid's Room", 'Office']}
    json5::from_str(encoded)
        .map_err(|e| ConfigError::InvalidRooms(format!("cannot decode '{}': {}", encoded, e)))
}

fn member_names(room: &str, list: &[Value]) -> Vec<String> {
    list.iter()
        .filter_map(|member| match member {
            Value::String(name) => Some(name.clone()),
            other => {
                warn!("ignoring member {} of room '{}': not a zone name", other, room);
                None
            }
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Networks that are not globally routable (IANA special-purpose registry)
const NON_GLOBAL_NETWORKS: &[(Ipv4Addr, u32)] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(100, 64, 0, 0), 10),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 0, 0, 0), 24),
    (Ipv4Addr::new(192, 0, 2, 0), 24),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(198, 18, 0, 0), 15),
    (Ipv4Addr::new(198, 51, 100, 0), 24),
    (Ipv4Addr::new(203, 0, 113, 0), 24),
    (Ipv4Addr::new(240, 0, 0, 0), 4),
    (Ipv4Addr::new(255, 255, 255, 255), 32),
];

/// Whether `addr` is globally routable
pub fn is_global(addr: Ipv4Addr) -> bool {
    let addr = u32::from(addr);
    !NON_GLOBAL_NETWORKS.iter().any(|(network, prefix)| {
        let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
        addr & mask == u32::from(*network)
    })
}

/// Parse a speaker address, which must not be globally routable
pub fn parse_private_ipv4(raw: &str) -> Result<Ipv4Addr, ConfigError> {
    let addr: Ipv4Addr = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidIpv4(raw.to_string()))?;
    if is_global(addr) {
        return Err(ConfigError::PublicIpv4(addr));
    }
    Ok(addr)
}

fn deserialize_ipv4<'de, D>(deserializer: D) -> Result<Option<Ipv4Addr>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_private_ipv4(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

fn default_discovery_timeout_secs() -> u64 {
    DEFAULT_DISCOVERY_TIMEOUT_SECS
}

/// Settings for `init`
///
/// ```json
/// {
///   "room": "Living",
///   "ipv4": "192.168.1.10",
///   "rooms": { "Downstairs": ["Living", "Kitchen"] },
///   "coordinator_policy": "fail",
///   "discovery_timeout_secs": 3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NeuronConfig {
    /// Default room for actions that do not name one
    pub room: String,

    /// Speaker to talk to; discovered by `room` name when absent
    #[serde(default, deserialize_with = "deserialize_ipv4")]
    pub ipv4: Option<Ipv4Addr>,

    #[serde(default)]
    pub rooms: RoomConfig,

    #[serde(default)]
    pub coordinator_policy: CoordinatorPolicy,

    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
}

impl NeuronConfig {
    pub fn new(room: &str) -> Self {
        Self {
            room: room.to_string(),
            ipv4: None,
            rooms: RoomConfig::default(),
            coordinator_policy: CoordinatorPolicy::default(),
            discovery_timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the settings carried by an `init` invocation
    pub fn from_invocation(invocation: &Invocation, policy: CoordinatorPolicy) -> Result<Self, NeuronError> {
        let room = invocation.room_name().ok_or_else(|| {
            NeuronError::InvalidParameter(
                "You must specify a valid sonos zone/group name for 'room' in init action".to_string(),
            )
        })?;

        let mut config = Self::new(room);
        config.coordinator_policy = policy;
        if let Some(raw) = invocation.ipv4.as_deref() {
            config.ipv4 = Some(parse_private_ipv4(raw)?);
        }
        if let Some(rooms) = &invocation.rooms {
            config.rooms = RoomConfig::from_value(rooms)?;
        }
        Ok(config)
    }

    pub fn with_ipv4(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.ipv4 = Some(parse_private_ipv4(raw)?);
        Ok(self)
    }

    pub fn with_coordinator_policy(mut self, policy: CoordinatorPolicy) -> Self {
        self.coordinator_policy = policy;
        self
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room.trim().is_empty() {
            return Err(ConfigError::MissingRoom);
        }
        Ok(())
    }
}
