//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The device did not answer within the agent's connect or read timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the device, carrying the UPnP error code
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

impl SoapError {
    /// Short name of the error class, used in operator-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            SoapError::Network(_) => "Network",
            SoapError::Timeout(_) => "Timeout",
            SoapError::Parse(_) => "Parse",
            SoapError::Fault(_) => "Fault",
        }
    }
}
