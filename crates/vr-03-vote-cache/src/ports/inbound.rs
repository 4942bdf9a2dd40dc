//! # Driving Ports (Inbound API)
//!
//! The holding-queue contract used by the forwarding subsystem.

use crate::domain::{CacheError, CachedVote};
use shared_types::{CacheKey, Vote};
use std::collections::VecDeque;

/// Holding queues of undelivered votes, one per identity.
///
/// Each queue is mutated under its own lock; operations on different
/// identities never contend.
pub trait VoteCache: Send + Sync {
    /// Append `vote` to the back of the queue for `key`.
    fn push_back(&self, key: &CacheKey, vote: Vote);

    /// Take every entry queued for `key`, in queue order, with the time
    /// each was first cached.
    fn drain_entries(&self, key: &CacheKey) -> VecDeque<CachedVote>;

    /// Put `entries` back at the front of the queue for `key`, keeping their
    /// relative order ahead of anything queued meanwhile. Cache times are
    /// kept as given, so a vote that keeps failing replay still expires.
    fn push_front_entries(&self, key: &CacheKey, entries: Vec<CachedVote>);

    /// Put `votes` back at the front of the queue for `key`, stamped as
    /// cached now.
    fn push_front(&self, key: &CacheKey, votes: Vec<Vote>);

    /// Take every vote queued for `key`, in queue order.
    fn drain(&self, key: &CacheKey) -> VecDeque<Vote> {
        self.drain_entries(key)
            .into_iter()
            .map(|entry| entry.vote)
            .collect()
    }

    /// Number of votes queued for `key`.
    fn pending(&self, key: &CacheKey) -> usize;

    /// Flush the cache to durable storage, if it has any.
    fn halt(&self) -> Result<(), CacheError> {
        Ok(())
    }

    /// Queue a vote for a backend server.
    fn add_to_cache(&self, vote: Vote, server: &str) {
        self.push_back(&CacheKey::Server(server.to_string()), vote);
    }

    /// Queue a vote for a player.
    fn add_to_cache_player(&self, vote: Vote, player: &str) {
        self.push_back(&CacheKey::Player(player.to_string()), vote);
    }

    /// Take all votes held for a backend server.
    fn evict(&self, server: &str) -> VecDeque<Vote> {
        self.drain(&CacheKey::Server(server.to_string()))
    }

    /// Take all votes held for a player.
    fn evict_player(&self, player: &str) -> VecDeque<Vote> {
        self.drain(&CacheKey::Player(player.to_string()))
    }
}
