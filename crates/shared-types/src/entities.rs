//! # Core Domain Entities
//!
//! Defines the records that flow through every subsystem.
//!
//! - [`Vote`]: a decoded vote, immutable once built
//! - [`ProtocolVersion`]: the wire generation a vote arrived over
//! - [`CacheKey`]: identity of a holding queue (backend server or player)

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user endorsing a service on a vote-listing site.
///
/// The timestamp is kept as text because listing sites send it verbatim and
/// backends expect to receive it unchanged. Use [`Vote::parsed_timestamp`]
/// when an ordering is needed.
///
/// # Example
///
/// ```rust
/// use shared_types::Vote;
///
/// let vote = Vote::new("ListingSite", "alice", "127.0.0.1", "1700000000");
/// assert_eq!(vote.parsed_timestamp(), Some(1_700_000_000));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Name of the listing service that sent the vote.
    pub service_name: String,
    /// Username the vote was cast for.
    pub username: String,
    /// Address the vote originated from.
    pub address: String,
    /// Decimal timestamp as sent by the service.
    pub timestamp: String,
}

impl Vote {
    /// Creates a new vote.
    pub fn new(
        service_name: impl Into<String>,
        username: impl Into<String>,
        address: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            username: username.into(),
            address: address.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Returns the timestamp as an integer, if it is one.
    pub fn parsed_timestamp(&self) -> Option<i64> {
        self.timestamp.trim().parse().ok()
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vote (from:{} username:{} address:{} timeStamp:{})",
            self.service_name, self.username, self.address, self.timestamp
        )
    }
}

/// Wire generation a vote was received over.
///
/// Attached to a protocol session once negotiated and never changed for the
/// lifetime of that connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Whole-message RSA encryption with a fixed five-field plaintext.
    LegacyEncrypted,
    /// JSON message authenticated with an HMAC token and a connection challenge.
    TokenAuthenticated,
}

impl ProtocolVersion {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LegacyEncrypted => "legacy",
            Self::TokenAuthenticated => "token",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of a holding queue.
///
/// Server names and player names are separate key spaces; the same string
/// may name both a server and a player without the queues interacting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Queue of votes waiting for a backend server to become reachable.
    Server(String),
    /// Queue of votes waiting for a player to join an allowed server.
    Player(String),
}

impl CacheKey {
    /// The identity string without its key space.
    pub fn identity(&self) -> &str {
        match self {
            Self::Server(name) | Self::Player(name) => name,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(name) => write!(f, "server '{}'", name),
            Self::Player(name) => write!(f, "player '{}'", name),
        }
    }
}
