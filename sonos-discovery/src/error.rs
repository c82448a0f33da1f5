//! Error types for the discovery system.

use std::fmt;

/// Error type for discovery operations.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Socket creation, HTTP request or other transport failure
    NetworkError(String),
    /// The device did not answer within the discovery timeout
    Timeout(String),
    /// Malformed SSDP response or device description XML
    ParseError(String),
    /// The device answered but is not a Sonos ZonePlayer
    InvalidDevice(String),
}

impl DiscoveryError {
    /// Short name of the error class, used in operator-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            DiscoveryError::NetworkError(_) => "NetworkError",
            DiscoveryError::Timeout(_) => "Timeout",
            DiscoveryError::ParseError(_) => "ParseError",
            DiscoveryError::InvalidDevice(_) => "InvalidDevice",
        }
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DiscoveryError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            DiscoveryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DiscoveryError::InvalidDevice(msg) => write!(f, "Invalid device: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<reqwest::Error> for DiscoveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DiscoveryError::Timeout(err.to_string())
        } else {
            DiscoveryError::NetworkError(err.to_string())
        }
    }
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
