//! Checkpoint error types.

use crate::checker::ProtocolError;
use thiserror::Error;

/// Errors that can occur while encoding, decoding or restoring a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The recorded session is not one the kind's protocol could produce
    #[error("Checkpoint validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
