use std::net::Ipv4Addr;

use thiserror::Error;

/// Errors surfaced to the host that invoked an action
///
/// Every variant carries a message meant for the operator; there are no
/// structured codes beyond the variant itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NeuronError {
    /// A required parameter was not supplied (only `action` today)
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter was supplied but cannot be used
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The speakers could not be reached or answered with an error
    #[error("Sonos failure: {0}")]
    SonosFailure(String),
}

pub type Result<T> = std::result::Result<T, NeuronError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("You must specify a valid sonos zone/group name for 'room'")]
    MissingRoom,

    #[error("The configured value for 'ipv4'(='{0}') is not a valid IPv4 address")]
    InvalidIpv4(String),

    #[error("You must specify a private range IP address for 'ipv4' (got {0})")]
    PublicIpv4(Ipv4Addr),

    #[error("Invalid 'rooms' setting: {0}")]
    InvalidRooms(String),

    #[error("Unknown coordinator policy '{0}' (expected 'fail' or 'fallback')")]
    UnknownPolicy(String),
}

impl From<ConfigError> for NeuronError {
    fn from(error: ConfigError) -> Self {
        NeuronError::InvalidParameter(error.to_string())
    }
}
