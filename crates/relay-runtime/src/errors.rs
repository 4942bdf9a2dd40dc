//! # Runtime Errors

use crate::container::ConfigError;
use thiserror::Error;
use vr_01_key_store::KeyStoreError;
use vr_03_vote_cache::CacheError;
use vr_04_vote_forwarding::ForwardingError;

/// Failures while starting, reconfiguring or stopping the relay.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("Vote cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Forwarding error: {0}")]
    Forwarding(#[from] ForwardingError),

    #[error("No tokio runtime is running on this thread")]
    NoAsyncRuntime,
}
