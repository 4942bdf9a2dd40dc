//! # Cache Errors

use thiserror::Error;

/// Failures while persisting or loading cached votes.
///
/// None of these ever block vote processing; callers log them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file could not be read or written.
    #[error("Vote cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but does not hold a cache snapshot.
    #[error("Vote cache file {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// The snapshot could not be serialized.
    #[error("Could not serialize vote cache: {0}")]
    Serialization(String),
}
