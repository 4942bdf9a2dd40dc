//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Ciphertext is not exactly one key-sized block
    #[error("Invalid block length: expected {expected}, got {actual}")]
    InvalidBlockLength {
        /// Modulus size in bytes
        expected: usize,
        /// Actual ciphertext length in bytes
        actual: usize,
    },

    /// Plaintext does not fit in one block
    #[error("Plaintext too long: {len} bytes (max: {max})")]
    PlaintextTooLong {
        /// Plaintext length in bytes
        len: usize,
        /// Maximum plaintext for this key
        max: usize,
    },

    /// Invalid public key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Key could not be encoded for storage
    #[error("Key encoding failed: {0}")]
    KeyEncodingFailed(String),
}
