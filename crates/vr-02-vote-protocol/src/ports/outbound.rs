//! # Driven Ports (Outbound SPI)
//!
//! What the connection driver needs from the host.

use crate::domain::ConnectionError;
use shared_types::{ProtocolVersion, Vote};

/// Receives every vote a connection decodes successfully.
///
/// Called from connection tasks, possibly many at once.
pub trait VoteReceiver: Send + Sync {
    /// A vote was decoded and authenticated.
    fn on_vote_received(&self, vote: Vote, version: ProtocolVersion, remote_addr: &str);

    /// A connection ended without delivering a vote.
    fn on_error(&self, _error: &ConnectionError, _remote_addr: &str) {}
}

/// Receiver that records what it is given.
#[cfg(test)]
#[derive(Default)]
pub struct MockVoteReceiver {
    pub votes: parking_lot::Mutex<Vec<(Vote, ProtocolVersion, String)>>,
    pub errors: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl VoteReceiver for MockVoteReceiver {
    fn on_vote_received(&self, vote: Vote, version: ProtocolVersion, remote_addr: &str) {
        self.votes
            .lock()
            .push((vote, version, remote_addr.to_string()));
    }

    fn on_error(&self, error: &ConnectionError, _remote_addr: &str) {
        self.errors.lock().push(error.to_string());
    }
}
