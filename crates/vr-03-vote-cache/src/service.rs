//! # Memory Vote Cache
//!
//! In-memory [`VoteCache`] with optional persistence through a
//! [`CacheStore`].
//!
//! ## Locking
//!
//! The identity map sits behind a read-mostly `RwLock`; each queue has its
//! own `Mutex`. A queue lock is never held while taking another queue's lock
//! or the map's write lock. Queues are never removed from the map once
//! created, so a queue handle taken by one caller cannot be orphaned by
//! another.

use crate::domain::{CacheError, CacheSnapshot, CachedVote};
use crate::ports::{CacheStore, SystemTimeSource, TimeSource, VoteCache};
use parking_lot::{Mutex, RwLock};
use shared_types::{CacheKey, Vote};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

type SharedQueue = Arc<Mutex<VecDeque<CachedVote>>>;

/// Thread-safe holding queues keyed by server or player.
pub struct MemoryVoteCache {
    queues: RwLock<HashMap<CacheKey, SharedQueue>>,
    clock: Arc<dyn TimeSource>,
    store: Option<Arc<dyn CacheStore>>,
}

impl MemoryVoteCache {
    /// Empty cache without persistence.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource))
    }

    /// Empty cache without persistence, stamping entries with `clock`.
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            clock,
            store: None,
        }
    }

    /// Cache backed by `store`, loaded with every stored vote younger than
    /// `ttl`.
    pub fn open(
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn TimeSource>,
        ttl: Duration,
    ) -> Result<Self, CacheError> {
        let mut snapshot = store.load_all()?;
        let dropped = snapshot.retain_fresh(
            clock.now_millis(),
            u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        );
        if dropped > 0 {
            warn!(dropped, "Discarded expired cached votes");
        }

        let mut cache = Self::with_clock(clock);
        cache.restore(snapshot);
        cache.store = Some(store);
        info!(votes = cache.snapshot().len(), "Loaded vote cache");
        Ok(cache)
    }

    /// Append every queue of `snapshot` behind what is already held.
    pub fn restore(&self, snapshot: CacheSnapshot) {
        for (key, entries) in snapshot.into_queues() {
            self.queue(&key).lock().extend(entries);
        }
    }

    /// Copy of every non-empty queue.
    pub fn snapshot(&self) -> CacheSnapshot {
        let queues: Vec<(CacheKey, SharedQueue)> = self
            .queues
            .read()
            .iter()
            .map(|(key, queue)| (key.clone(), Arc::clone(queue)))
            .collect();

        let mut snapshot = CacheSnapshot::default();
        for (key, queue) in queues {
            let entries: Vec<CachedVote> = queue.lock().iter().cloned().collect();
            snapshot.insert(&key, entries);
        }
        snapshot
    }

    /// Every identity that currently has votes queued.
    pub fn pending_keys(&self) -> Vec<CacheKey> {
        self.queues
            .read()
            .iter()
            .filter(|(_, queue)| !queue.lock().is_empty())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn queue(&self, key: &CacheKey) -> SharedQueue {
        if let Some(queue) = self.queues.read().get(key) {
            return Arc::clone(queue);
        }
        Arc::clone(self.queues.write().entry(key.clone()).or_default())
    }

    fn stamp(&self, vote: Vote) -> CachedVote {
        CachedVote::new(vote, self.clock.now_millis())
    }
}

impl Default for MemoryVoteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryVoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryVoteCache")
            .field("queues", &self.queues.read().len())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

impl VoteCache for MemoryVoteCache {
    fn push_back(&self, key: &CacheKey, vote: Vote) {
        let entry = self.stamp(vote);
        self.queue(key).lock().push_back(entry);
        debug!(%key, "Cached vote");
    }

    fn drain_entries(&self, key: &CacheKey) -> VecDeque<CachedVote> {
        let existing = self.queues.read().get(key).map(Arc::clone);
        match existing {
            Some(queue) => queue.lock().drain(..).collect(),
            None => VecDeque::new(),
        }
    }

    fn push_front_entries(&self, key: &CacheKey, entries: Vec<CachedVote>) {
        if entries.is_empty() {
            return;
        }
        let queue = self.queue(key);
        let mut queue = queue.lock();
        for entry in entries.into_iter().rev() {
            queue.push_front(entry);
        }
    }

    fn push_front(&self, key: &CacheKey, votes: Vec<Vote>) {
        let now = self.clock.now_millis();
        let entries = votes
            .into_iter()
            .map(|vote| CachedVote::new(vote, now))
            .collect();
        self.push_front_entries(key, entries);
    }

    fn pending(&self, key: &CacheKey) -> usize {
        self.queues
            .read()
            .get(key)
            .map_or(0, |queue| queue.lock().len())
    }

    /// Persist every queue if a store is attached.
    fn halt(&self) -> Result<(), CacheError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let snapshot = self.snapshot();
        store.persist(&snapshot)?;
        info!(votes = snapshot.len(), "Saved vote cache");
        Ok(())
    }
}
