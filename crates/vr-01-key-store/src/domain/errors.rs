//! # Key Store Errors

use shared_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while looking up or loading keys.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// No token is registered under this name.
    #[error("Unknown token: {0}")]
    TokenNotFound(String),

    /// Key material could not be parsed or generated.
    #[error("Key material error: {0}")]
    Crypto(#[from] CryptoError),

    /// Key files could not be read or written.
    #[error("Key file error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
