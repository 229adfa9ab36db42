//! Error types for Eldom client operations

use eldom_proto::{DeviceFamily, ProtocolError};
use thiserror::Error;

/// Result type alias for Eldom client operations
pub type Result<T> = std::result::Result<T, EldomClientError>;

/// Errors that can occur during Eldom client operations
#[derive(Error, Debug)]
pub enum EldomClientError {
    /// HTTP request failed (connectivity, TLS, body read)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Request timed out at the server or gateway
    #[error("Request timed out")]
    Timeout,

    /// Token endpoint did not hand out a usable token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Caller passed a value the device family does not accept
    #[error("Invalid {family} state: {value:?}")]
    InvalidDomainState { family: DeviceFamily, value: String },

    /// Encrypted response could not be opened
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// No device matched a lookup
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Caller tried to set a field the command builder places itself
    #[error("Field {0:?} is reserved for the command envelope")]
    ReservedField(String),
}

impl EldomClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure happened on the way to or from the relay,
    /// as opposed to a protocol mismatch or a caller error
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::ServerError { .. } | Self::Timeout
        )
    }
}

impl From<ProtocolError> for EldomClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidDomainState { family, value } => {
                Self::InvalidDomainState { family, value }
            }
            ProtocolError::DecryptionFailed(message) => Self::DecryptionFailed(message),
            ProtocolError::JsonError(e) => Self::ParseError(e.to_string()),
        }
    }
}
