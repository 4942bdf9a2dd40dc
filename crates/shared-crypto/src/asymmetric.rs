//! # Asymmetric Block Encryption
//!
//! RSA with PKCS#1 v1.5 padding, one block per message. Used by the legacy
//! vote protocol where the whole message is a single encrypted block whose
//! length equals the key modulus.
//!
//! ## Key Encoding
//!
//! Keys are stored as base64 text of their DER encoding:
//! - public key: X.509 `SubjectPublicKeyInfo`
//! - private key: PKCS#8 `PrivateKeyInfo`

use crate::CryptoError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

/// Bytes of PKCS#1 v1.5 padding overhead per block.
const PKCS1_V15_OVERHEAD: usize = 11;

/// Default modulus size for generated keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// RSA key pair for the legacy protocol.
#[derive(Clone, Debug)]
pub struct LegacyKeyPair {
    public: RsaPublicKey,
    private: RsaPrivateKey,
}

impl LegacyKeyPair {
    /// Generate a fresh key pair.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KeyGenerationFailed` if the modulus size is rejected.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { public, private })
    }

    /// Build a pair from DER encodings, rejecting halves that do not match.
    pub fn from_der(public_der: &[u8], private_der: &[u8]) -> Result<Self, CryptoError> {
        let public = RsaPublicKey::from_public_key_der(public_der)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        let private = RsaPrivateKey::from_pkcs8_der(private_der)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;

        if private.to_public_key() != public {
            return Err(CryptoError::InvalidPrivateKey(
                "private key does not belong to public key".to_string(),
            ));
        }
        Ok(Self { public, private })
    }

    /// Build a pair from base64 text as found in key files.
    pub fn from_base64(public_b64: &str, private_b64: &str) -> Result<Self, CryptoError> {
        let public_der = STANDARD
            .decode(strip_whitespace(public_b64))
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        let private_der = STANDARD
            .decode(strip_whitespace(private_b64))
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_der(&public_der, &private_der)
    }

    /// Encode both halves as base64 text: `(public, private)`.
    pub fn to_base64(&self) -> Result<(String, String), CryptoError> {
        let public_der = self
            .public
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyEncodingFailed(e.to_string()))?;
        let private_der = self
            .private
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyEncodingFailed(e.to_string()))?;
        Ok((
            STANDARD.encode(public_der.as_bytes()),
            STANDARD.encode(private_der.as_bytes()),
        ))
    }

    /// Public half.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Private half.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Ciphertext block length in bytes.
    pub fn block_size(&self) -> usize {
        self.public.size()
    }
}

/// Encrypt one block for the holder of `public`.
///
/// # Errors
///
/// Returns `CryptoError::PlaintextTooLong` if the plaintext does not fit in
/// one padded block.
pub fn encrypt_block(public: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let max = public.size().saturating_sub(PKCS1_V15_OVERHEAD);
    if plaintext.len() > max {
        return Err(CryptoError::PlaintextTooLong {
            len: plaintext.len(),
            max,
        });
    }

    public
        .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Decrypt exactly one block.
///
/// # Errors
///
/// Returns `CryptoError::InvalidBlockLength` when the ciphertext is not the
/// modulus size, and `CryptoError::DecryptionFailed` when the padding does
/// not verify (wrong key or corrupted data).
pub fn decrypt_block(private: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let expected = private.size();
    if ciphertext.len() != expected {
        return Err(CryptoError::InvalidBlockLength {
            expected,
            actual: ciphertext.len(),
        });
    }

    private
        .decrypt(Pkcs1v15Encrypt, ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    // Key generation is slow in debug builds; share one pair per test binary.
    fn test_pair() -> &'static LegacyKeyPair {
        static PAIR: OnceLock<LegacyKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| LegacyKeyPair::generate(1024).unwrap())
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let pair = test_pair();
        let plaintext = b"VOTE\nTest\ntest\ntest\ntest\n";

        let block = encrypt_block(pair.public_key(), plaintext).unwrap();
        assert_eq!(block.len(), pair.block_size());

        let decrypted = decrypt_block(pair.private_key(), &block).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let pair = test_pair();
        let result = decrypt_block(pair.private_key(), &[0u8; 10]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidBlockLength { actual: 10, .. })
        ));
    }

    #[test]
    fn test_tampered_block_fails() {
        let pair = test_pair();
        let mut block = encrypt_block(pair.public_key(), b"hello").unwrap();
        block[0] ^= 0xFF;
        block[1] ^= 0xFF;
        assert!(decrypt_block(pair.private_key(), &block).is_err());
    }

    #[test]
    fn test_plaintext_too_long() {
        let pair = test_pair();
        let plaintext = vec![b'a'; pair.block_size()];
        assert!(matches!(
            encrypt_block(pair.public_key(), &plaintext),
            Err(CryptoError::PlaintextTooLong { .. })
        ));
    }

    #[test]
    fn test_base64_roundtrip() {
        let pair = test_pair();
        let (public, private) = pair.to_base64().unwrap();
        let restored = LegacyKeyPair::from_base64(&public, &private).unwrap();
        assert_eq!(restored.public_key(), pair.public_key());
    }

    #[test]
    fn test_mismatched_halves_rejected() {
        let pair = test_pair();
        let other = LegacyKeyPair::generate(1024).unwrap();
        let (public, _) = other.to_base64().unwrap();
        let (_, private) = pair.to_base64().unwrap();
        assert!(matches!(
            LegacyKeyPair::from_base64(&public, &private),
            Err(CryptoError::InvalidPrivateKey(_))
        ));
    }
}
