//! # Forwarding Service
//!
//! Fans each received vote out to every allowed backend server. Servers that
//! cannot be reached get the vote queued in the cache; when a server
//! reconnects, or a player switches onto a server, the matching queue is
//! replayed through the [`EvictionEngine`].
//!
//! ## Flow
//!
//! ```text
//! forward(vote) ──for each allowed server──→ send_to_consumer
//!                                               │ false
//!                                               ▼
//!                                  cache.add_to_cache(vote, server)
//!
//! on_server_connect(server) ──drain(server)──→ EvictionEngine ──remaining──→ push_front(server)
//! handle_player_switch(server, player) ──drain(player)──→ sort by timestamp ──→ EvictionEngine
//!                                                                   └──remaining──→ push_front(player)
//! ```
//!
//! Requeued votes keep the time they were first cached, so the cache TTL
//! still applies to votes that never replay successfully.
//!
//! Without a cache, a failed delivery is a lost vote: logged and counted,
//! never raised to the caller.
//!
//! ## Shutdown
//!
//! [`ForwardingService::halt`] interrupts every replay still waiting on the
//! scheduler, returns its votes to the cache, and only then saves the cache.
//! Replays requested after `halt` are handed straight back to the cache.

mod eviction;

pub use eviction::{DrainCallback, EvictionEngine};

use crate::domain::{
    DrainOutcome, ForwardReport, ForwardingConfig, ForwardingError, ForwardingStats,
    ForwardingStatsSnapshot, ServerFilter,
};
use crate::ports::{ConsumerNetwork, Scheduler};
use shared_types::{encode_vote, CacheKey, Vote};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, warn};
use vr_03_vote_cache::{CachedVote, VoteCache};

/// Distributes votes to backend servers with cached replay.
pub struct ForwardingService {
    network: Arc<dyn ConsumerNetwork>,
    cache: Option<Arc<dyn VoteCache>>,
    filter: ServerFilter,
    engine: EvictionEngine,
    stats: Arc<ForwardingStats>,
}

impl ForwardingService {
    /// Build the service. Fails if `config` is invalid.
    pub fn new(
        network: Arc<dyn ConsumerNetwork>,
        scheduler: Arc<dyn Scheduler>,
        cache: Option<Arc<dyn VoteCache>>,
        config: ForwardingConfig,
    ) -> Result<Self, ForwardingError> {
        config.validate()?;
        let stats = Arc::new(ForwardingStats::default());
        let engine = EvictionEngine::new(
            Arc::clone(&network),
            scheduler,
            Arc::clone(&stats),
            config.dump_rate,
            config.schedule,
        );
        Ok(Self {
            network,
            cache,
            filter: config.filter,
            engine,
            stats,
        })
    }

    /// Deliver `vote` to every allowed server, caching it for the ones that
    /// are unreachable.
    pub fn forward(&self, vote: &Vote) -> ForwardReport {
        // Unencodable votes count as undelivered so they stay cached.
        let data = encode_vote(vote)
            .map_err(|e| error!(%vote, error = %e, "Unable to encode vote"))
            .ok();
        let mut report = ForwardReport::default();

        for server in self.network.known_consumers() {
            if !self.filter.is_allowed(&server) {
                report.filtered.push(server);
                continue;
            }
            let sent = data
                .as_deref()
                .is_some_and(|data| self.network.send_to_consumer(&server, data));
            if sent {
                debug!(%vote, server = %server, "Successfully forwarded vote");
                self.stats.record_delivered();
                report.delivered.push(server);
            } else if self.attempt_to_add_to_cache(vote, &CacheKey::Server(server.clone())) {
                report.cached.push(server);
            } else {
                report.lost.push(server);
            }
        }
        report
    }

    /// Hold `vote` until `player` joins an allowed server.
    ///
    /// Returns false if there is no cache and the vote is lost.
    pub fn cache_for_player(&self, vote: &Vote, player: &str) -> bool {
        self.attempt_to_add_to_cache(vote, &CacheKey::Player(player.to_string()))
    }

    /// Replay everything held for `server` now that it is reachable.
    pub fn on_server_connect(&self, server: &str) {
        let Some(cache) = &self.cache else {
            return;
        };
        let key = CacheKey::Server(server.to_string());
        let entries = cache.drain_entries(&key);
        self.replay(server, key, entries.into(), cache);
    }

    /// Replay everything held for `player` to the server they just joined,
    /// oldest vote first.
    pub fn handle_player_switch(&self, server: &str, player: &str) {
        let Some(cache) = &self.cache else {
            return;
        };
        if !self.filter.is_allowed(server) {
            return;
        }

        let key = CacheKey::Player(player.to_string());
        let mut entries: Vec<CachedVote> = cache.drain_entries(&key).into();
        // Unparsable timestamps go last, in their original order.
        entries.sort_by_key(|entry| match entry.vote.parsed_timestamp() {
            Some(ts) => (0, ts),
            None => (1, 0),
        });
        self.replay(server, key, entries, cache);
    }

    /// Return every pending replay's votes to the cache, then persist the
    /// cache if it has durable storage.
    pub fn halt(&self) -> Result<(), ForwardingError> {
        self.engine.cancel_all();
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        cache.halt().map_err(|e| {
            error!(error = %e, "Unable to save cached votes, votes will be lost");
            ForwardingError::from(e)
        })
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn stats(&self) -> ForwardingStatsSnapshot {
        self.stats.snapshot()
    }

    fn replay(
        &self,
        server: &str,
        source: CacheKey,
        entries: Vec<CachedVote>,
        cache: &Arc<dyn VoteCache>,
    ) {
        let cache = Arc::clone(cache);
        let key = source.clone();
        let (votes, cached_at): (VecDeque<Vote>, Vec<u64>) = entries
            .into_iter()
            .map(|entry| (entry.vote, entry.cached_at))
            .unzip();
        self.engine.drain(
            server,
            source,
            votes,
            Box::new(move |outcome: DrainOutcome| {
                // What is left is always the tail of the replayed queue.
                let skip = cached_at.len().saturating_sub(outcome.remaining.len());
                let entries = outcome
                    .remaining
                    .into_iter()
                    .zip(cached_at.into_iter().skip(skip))
                    .map(|(vote, at)| CachedVote::new(vote, at))
                    .collect();
                cache.push_front_entries(&key, entries);
            }),
        );
    }

    fn attempt_to_add_to_cache(&self, vote: &Vote, key: &CacheKey) -> bool {
        match &self.cache {
            Some(cache) => {
                cache.push_back(key, vote.clone());
                self.stats.record_cached();
                debug!(%vote, "Added to forwarding cache for {}", key);
                true
            }
            None => {
                self.stats.record_lost();
                warn!(%vote, "Could not immediately send vote to backend, vote lost for {}", key);
                false
            }
        }
    }
}

impl std::fmt::Debug for ForwardingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingService")
            .field("filter", &self.filter)
            .field("cache", &self.cache.is_some())
            .field("engine", &self.engine)
            .finish()
    }
}
