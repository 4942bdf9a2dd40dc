//! # Protocol Session
//!
//! Per-connection state. A session is owned by exactly one connection task
//! and is never shared.
//!
//! ```text
//! [AwaitingHandshake] ──token magic──→ [AwaitingAuth] ──verified──→ [Negotiated(Token)]
//!         │                                                                 │
//!         └──────────── legacy block decrypted ──→ [Negotiated(Legacy)]     │
//!                                                            │              │
//!                any failure, or connection end ──────────→ [Closed] ←──────┘
//! ```

use super::errors::DecodeError;
use shared_crypto::random_token;
use shared_types::ProtocolVersion;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Greeting sent (or about to be), no frame seen yet.
    AwaitingHandshake,
    /// A token frame was detected and is being authenticated.
    AwaitingAuth,
    /// A frame was accepted under this version.
    Negotiated(ProtocolVersion),
    /// Terminal.
    Closed,
}

/// Mutable state of one inbound connection.
#[derive(Debug)]
pub struct ProtocolSession {
    state: SessionState,
    selected: Option<ProtocolVersion>,
    challenge: String,
}

impl ProtocolSession {
    /// New session with a fresh random challenge.
    pub fn new() -> Self {
        Self::with_challenge(random_token())
    }

    /// New session with a fixed challenge.
    pub fn with_challenge(challenge: impl Into<String>) -> Self {
        Self {
            state: SessionState::AwaitingHandshake,
            selected: None,
            challenge: challenge.into(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Version chosen for this connection. Stays readable after close so a
    /// failure can still be answered in the right protocol.
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.selected
    }

    /// Challenge token clients must echo. Empty once closed.
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Text written to the client as soon as the connection opens.
    pub fn greeting(&self) -> String {
        format!("VOTIFIER 2 {}\n", self.challenge)
    }

    /// Record the version a frame arrived in.
    ///
    /// The first frame fixes the version; a later frame of another version is
    /// rejected.
    pub fn select_version(&mut self, version: ProtocolVersion) -> Result<(), DecodeError> {
        match (self.state, self.selected) {
            (SessionState::Closed, _) => Err(DecodeError::SessionClosed),
            (_, Some(current)) if current != version => Err(DecodeError::MalformedFrame(
                format!("protocol changed from {} to {} mid-session", current, version),
            )),
            (SessionState::AwaitingHandshake, None) => {
                self.selected = Some(version);
                if version == ProtocolVersion::TokenAuthenticated {
                    self.state = SessionState::AwaitingAuth;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Mark the selected version as negotiated after a successful decode.
    pub fn negotiate(&mut self) -> Result<ProtocolVersion, DecodeError> {
        if self.is_closed() {
            return Err(DecodeError::SessionClosed);
        }
        let version = self.selected.ok_or_else(|| {
            DecodeError::MalformedFrame("no protocol selected for session".to_string())
        })?;
        self.state = SessionState::Negotiated(version);
        Ok(version)
    }

    /// Enter the terminal state and discard the challenge.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
        self.challenge.clear();
    }
}

impl Default for ProtocolSession {
    fn default() -> Self {
        Self::new()
    }
}
