//! # Protocol Errors
//!
//! Every decode failure is terminal for its connection. Each variant maps to
//! a [`DecodeFailureKind`] so callers can tell causes apart without matching
//! on messages.

use std::fmt;
use thiserror::Error;

/// Reasons a frame could not be turned into a vote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The legacy block could not be decrypted with the configured key.
    #[error("Could not decrypt vote block: {0}")]
    DecryptFailure(String),

    /// The legacy plaintext did not start with `VOTE`.
    #[error("VOTE opcode not found, got '{0}'")]
    BadOpcode(String),

    /// A required field was absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The legacy plaintext carried more than five fields.
    #[error("Too many fields in vote: expected 5, got {0}")]
    TooManyFields(usize),

    /// No token is registered for the declared service, and no default exists.
    #[error("Unknown service '{0}'")]
    UnknownToken(String),

    /// Signature or challenge did not match.
    #[error("Integrity check failed: {0}")]
    IntegrityFailure(&'static str),

    /// The bytes do not form a frame of either protocol.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The session already finished; no further decodes are accepted.
    #[error("Protocol session is closed")]
    SessionClosed,
}

impl DecodeError {
    /// Classification of this failure.
    pub fn kind(&self) -> DecodeFailureKind {
        match self {
            Self::DecryptFailure(_) => DecodeFailureKind::DecryptFailure,
            Self::BadOpcode(_) => DecodeFailureKind::BadOpcode,
            Self::MissingField(_) => DecodeFailureKind::MissingField,
            Self::TooManyFields(_) => DecodeFailureKind::TooManyFields,
            Self::UnknownToken(_) => DecodeFailureKind::UnknownToken,
            Self::IntegrityFailure(_) => DecodeFailureKind::IntegrityFailure,
            Self::MalformedFrame(_) => DecodeFailureKind::MalformedFrame,
            Self::SessionClosed => DecodeFailureKind::SessionClosed,
        }
    }
}

/// Field-free classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeFailureKind {
    DecryptFailure,
    BadOpcode,
    MissingField,
    TooManyFields,
    UnknownToken,
    IntegrityFailure,
    MalformedFrame,
    SessionClosed,
}

impl DecodeFailureKind {
    /// Stable name, used as the `cause` of negative acknowledgements and as a
    /// metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DecryptFailure => "DecryptFailure",
            Self::BadOpcode => "BadOpcode",
            Self::MissingField => "MissingField",
            Self::TooManyFields => "TooManyFields",
            Self::UnknownToken => "UnknownToken",
            Self::IntegrityFailure => "IntegrityFailure",
            Self::MalformedFrame => "MalformedFrame",
            Self::SessionClosed => "SessionClosed",
        }
    }
}

impl fmt::Display for DecodeFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from driving a single inbound connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Reading from or writing to the stream failed.
    #[error("Connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client stopped sending before a frame was complete.
    #[error("Timed out waiting for vote data after {received} bytes")]
    Timeout { received: usize },

    /// The client closed the stream before a frame was complete.
    #[error("Connection closed after {received} bytes, before a complete vote frame")]
    Incomplete { received: usize },

    /// The frame was rejected.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
