//! # Forwarding Errors

use thiserror::Error;
use vr_03_vote_cache::CacheError;

/// Errors from configuring or shutting down forwarding.
///
/// Delivery failures are not errors; they end up in the cache or are
/// counted as lost.
#[derive(Debug, Error)]
pub enum ForwardingError {
    /// The dump rate must allow at least one vote per chunk.
    #[error("Dump rate must be at least 1, got {0}")]
    InvalidDumpRate(usize),

    /// Cached votes could not be saved at shutdown.
    #[error("Unable to save cached votes: {0}")]
    Persistence(#[from] CacheError),
}
