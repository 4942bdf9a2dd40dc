//! # Vote Forwarding Subsystem
//!
//! **Subsystem ID:** 4
//!
//! ## Purpose
//!
//! Relays each received vote to every allowed backend server. Votes that
//! cannot be delivered are held in the vote cache and replayed later, in
//! bounded chunks with cool-downs, when the server reconnects or the voting
//! player switches onto a server.
//!
//! ## Guarantees
//!
//! | Guarantee | Enforcement Location |
//! |-----------|---------------------|
//! | A failed delivery is cached only under the failing server | `service/mod.rs` - `forward()` |
//! | Server queues replay in insertion order | `domain/drain.rs` - `DrainJob` |
//! | Player queues replay oldest timestamp first | `service/mod.rs` - `handle_player_switch()` |
//! | A failed chunk returns to the front, in order | `domain/drain.rs` - `record()` |
//! | At most `dump_rate` votes per chunk | `domain/drain.rs` - `take_chunk()` |
//! | Replay never blocks the caller | `ports/outbound.rs` - `Scheduler` |
//!
//! ## Replay Timing
//!
//! ```text
//! evict ──3s──→ chunk 1 ──1s──→ chunk 2 ──1s──→ ... ──→ done
//!                  │                │
//!                  └── failure ─────┴──→ chunk back to front, stop
//! ```
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `ConsumerNetwork` | Backend server registry and delivery |
//! | `Scheduler` | Delayed, non-blocking replay attempts |
//! | `VoteCache` (vr-03) | Holding queues |
//!
//! ## Module Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  adapters/ - TokioScheduler                                  │
//! └──────────────────────────────────────────────────────────────┘
//!                        ↑ implements ↑
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ports/outbound.rs - ConsumerNetwork, Scheduler              │
//! └──────────────────────────────────────────────────────────────┘
//!                        ↑ uses ↑
//! ┌──────────────────────────────────────────────────────────────┐
//! │  service/    - ForwardingService, EvictionEngine             │
//! │  domain/     - DrainJob, ServerFilter, ForwardingConfig      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::TokioScheduler;
pub use domain::*;
pub use ports::{ConsumerNetwork, ScheduledTask, Scheduler};
pub use service::{DrainCallback, EvictionEngine, ForwardingService};
