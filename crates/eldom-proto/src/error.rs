//! Error types for the direct-request wire protocol

use thiserror::Error;

use crate::family::DeviceFamily;

/// Errors that can occur while building or decoding direct-request payloads
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Domain value is not accepted by the device family
    #[error("invalid {family} state: {value:?}")]
    InvalidDomainState { family: DeviceFamily, value: String },

    /// Ciphertext could not be decoded, decrypted, unpadded or parsed
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Create an invalid state error for a family
    pub fn invalid_state(family: DeviceFamily, value: impl ToString) -> Self {
        Self::InvalidDomainState {
            family,
            value: value.to_string(),
        }
    }

    /// Create a decryption error
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::DecryptionFailed(message.into())
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
