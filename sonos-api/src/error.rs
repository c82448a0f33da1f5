use soap_client::SoapError;
use thiserror::Error;

/// Errors returned by Sonos operations
///
/// Abstracts the SOAP transport details into the failure classes callers
/// care about: the speaker was unreachable, it answered slowly, it answered
/// with something unparseable, or it refused the request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, HTTP status without a SOAP body
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Connect or read timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The response or an embedded document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// UPnP error code returned in a SOAP fault
    #[error("SOAP fault: error code {0}")]
    SoapFault(u16),
}

impl ApiError {
    /// Short name of the error class, used in operator-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NetworkError(_) => "NetworkError",
            ApiError::Timeout(_) => "Timeout",
            ApiError::ParseError(_) => "ParseError",
            ApiError::SoapFault(_) => "SoapFault",
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Timeout(msg) => ApiError::Timeout(msg),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault(code) => ApiError::SoapFault(code),
        }
    }
}
