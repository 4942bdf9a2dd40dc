//! # Cache Snapshot
//!
//! Point-in-time copy of every non-empty queue, in queue order. This is what
//! gets persisted at shutdown and restored at startup.
//!
//! ```json
//! {
//!   "servers": { "lobby": [ {"serviceName":..,"username":..,"address":..,"timestamp":..,"cachedAt":1700000000000} ] },
//!   "players": { "alice": [ .. ] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{CacheKey, Vote};
use std::collections::BTreeMap;

/// A queued vote and the time it entered the cache (ms since the epoch).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedVote {
    #[serde(flatten)]
    pub vote: Vote,
    #[serde(rename = "cachedAt", default)]
    pub cached_at: u64,
}

impl CachedVote {
    pub fn new(vote: Vote, cached_at: u64) -> Self {
        Self { vote, cached_at }
    }
}

/// Every queue of a cache, keyed by identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub servers: BTreeMap<String, Vec<CachedVote>>,
    #[serde(default)]
    pub players: BTreeMap<String, Vec<CachedVote>>,
}

impl CacheSnapshot {
    /// Add a queue to the snapshot. Empty queues are skipped.
    pub fn insert(&mut self, key: &CacheKey, entries: Vec<CachedVote>) {
        if entries.is_empty() {
            return;
        }
        let map = match key {
            CacheKey::Server(_) => &mut self.servers,
            CacheKey::Player(_) => &mut self.players,
        };
        map.insert(key.identity().to_string(), entries);
    }

    /// All queues with their cache keys.
    pub fn into_queues(self) -> impl Iterator<Item = (CacheKey, Vec<CachedVote>)> {
        let servers = self
            .servers
            .into_iter()
            .map(|(name, entries)| (CacheKey::Server(name), entries));
        let players = self
            .players
            .into_iter()
            .map(|(name, entries)| (CacheKey::Player(name), entries));
        servers.chain(players)
    }

    /// Total number of votes held.
    pub fn len(&self) -> usize {
        self.servers
            .values()
            .chain(self.players.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop votes cached more than `ttl_ms` before `now`. Returns how many
    /// were dropped.
    pub fn retain_fresh(&mut self, now: u64, ttl_ms: u64) -> usize {
        let before = self.len();
        for entries in self.servers.values_mut().chain(self.players.values_mut()) {
            entries.retain(|entry| now.saturating_sub(entry.cached_at) <= ttl_ms);
        }
        self.servers.retain(|_, entries| !entries.is_empty());
        self.players.retain(|_, entries| !entries.is_empty());
        before - self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, cached_at: u64) -> CachedVote {
        CachedVote::new(Vote::new("Site", user, "127.0.0.1", "1"), cached_at)
    }

    #[test]
    fn test_json_shape() {
        let mut snapshot = CacheSnapshot::default();
        snapshot.insert(&CacheKey::Server("lobby".into()), vec![entry("alice", 5)]);

        let json: serde_json::Value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["servers"]["lobby"][0]["username"], "alice");
        assert_eq!(json["servers"]["lobby"][0]["serviceName"], "Site");
        assert_eq!(json["servers"]["lobby"][0]["cachedAt"], 5);
        assert!(json["players"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_missing_cached_at_defaults_to_zero() {
        let snapshot: CacheSnapshot = serde_json::from_str(
            r#"{"players":{"bob":[{"serviceName":"S","username":"bob","address":"a","timestamp":"1"}]}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.players["bob"][0].cached_at, 0);
        assert!(snapshot.servers.is_empty());
    }

    #[test]
    fn test_insert_skips_empty_queues() {
        let mut snapshot = CacheSnapshot::default();
        snapshot.insert(&CacheKey::Player("bob".into()), Vec::new());
        assert!(snapshot.is_empty());
        assert!(snapshot.players.is_empty());
    }

    #[test]
    fn test_retain_fresh() {
        let mut snapshot = CacheSnapshot::default();
        snapshot.insert(
            &CacheKey::Server("lobby".into()),
            vec![entry("old", 0), entry("new", 900)],
        );
        snapshot.insert(&CacheKey::Player("bob".into()), vec![entry("old", 100)]);

        let dropped = snapshot.retain_fresh(1_000, 500);

        assert_eq!(dropped, 2);
        assert_eq!(snapshot.servers["lobby"], vec![entry("new", 900)]);
        assert!(!snapshot.players.contains_key("bob"));
    }

    #[test]
    fn test_into_queues_keeps_key_spaces() {
        let mut snapshot = CacheSnapshot::default();
        snapshot.insert(&CacheKey::Server("x".into()), vec![entry("a", 0)]);
        snapshot.insert(&CacheKey::Player("x".into()), vec![entry("b", 0)]);

        let keys: Vec<CacheKey> = snapshot.into_queues().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![CacheKey::Server("x".into()), CacheKey::Player("x".into())]
        );
    }
}
