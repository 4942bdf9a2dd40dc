//! # Shared Crypto - Protocol Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `asymmetric` | RSA, PKCS#1 v1.5 | Legacy protocol vote blocks |
//! | `token` | HMAC-SHA256 | Token protocol signatures, challenges |
//!
//! ## Security Properties
//!
//! - **RSA blocks**: ciphertext length must equal the modulus size
//! - **HMAC**: tag comparison is constant time
//! - **Secrets**: token keys are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asymmetric;
pub mod errors;
pub mod token;

// Re-exports
pub use asymmetric::{decrypt_block, encrypt_block, LegacyKeyPair, DEFAULT_KEY_BITS};
pub use errors::CryptoError;
pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use token::{random_token, sign, verify, TokenKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
