//! # Vote Cache Subsystem (vr-03)
//!
//! Holding queues for votes that could not be delivered straight away.
//!
//! ## Key Spaces
//!
//! | Key | Filled by | Replay order |
//! |-----|-----------|--------------|
//! | `CacheKey::Server` | failed fan-out to a backend | insertion (FIFO) |
//! | `CacheKey::Player` | votes held until the player joins | sorted by timestamp at eviction |
//!
//! ## Concurrency
//!
//! Queues are appended from connection tasks, drained and refilled from
//! scheduled replay tasks, and evicted by host callbacks, all concurrently.
//! Each identity has its own lock; nothing locks across identities.
//!
//! ## Persistence
//!
//! [`MemoryVoteCache::open`] loads from a [`CacheStore`] and drops votes
//! older than the configured TTL; [`VoteCache::halt`] writes every
//! queue back.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::JsonFileStore;
pub use domain::*;
pub use ports::{CacheStore, SystemTimeSource, TimeSource, VoteCache};
pub use service::MemoryVoteCache;
