//! # Forwarding Reports and Counters

use std::sync::atomic::{AtomicU64, Ordering};

/// What happened to one vote during fan-out, per backend server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardReport {
    /// Servers that accepted the vote.
    pub delivered: Vec<String>,
    /// Servers that were unreachable; the vote is held for them.
    pub cached: Vec<String>,
    /// Servers that were unreachable with no cache configured.
    pub lost: Vec<String>,
    /// Servers skipped by the server filter.
    pub filtered: Vec<String>,
}

impl ForwardReport {
    /// True if no server lost the vote.
    pub fn is_safe(&self) -> bool {
        self.lost.is_empty()
    }
}

/// Running totals of forwarding outcomes.
#[derive(Debug, Default)]
pub struct ForwardingStats {
    delivered: AtomicU64,
    cached: AtomicU64,
    lost: AtomicU64,
    replayed: AtomicU64,
}

/// Point-in-time copy of [`ForwardingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardingStatsSnapshot {
    pub delivered: u64,
    pub cached: u64,
    pub lost: u64,
    pub replayed: u64,
}

impl ForwardingStats {
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cached(&self) {
        self.cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replayed(&self, votes: usize) {
        self.replayed.fetch_add(votes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ForwardingStatsSnapshot {
        ForwardingStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
            replayed: self.replayed.load(Ordering::Relaxed),
        }
    }
}
