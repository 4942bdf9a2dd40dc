//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors on the forwarding wire format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// Payload is not a sequence of vote objects.
    #[error("Malformed vote payload: {0}")]
    Malformed(String),
    /// Vote could not be serialized.
    #[error("Unable to encode vote: {0}")]
    Encode(String),
}
