//! # Token Authentication
//!
//! HMAC-SHA256 keyed with a shared token string. The token protocol signs the
//! exact payload bytes a client sends; verification is constant time.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Alphabet of generated tokens and challenges (base 32, lowercase).
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuv";

/// Length of generated tokens and challenges (130 random bits).
pub const TOKEN_LENGTH: usize = 26;

/// Shared secret used to authenticate token-protocol messages.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct TokenKey(Vec<u8>);

impl TokenKey {
    /// Derive a key from its token text. The key bytes are the UTF-8 bytes.
    pub fn from_token(token: &str) -> Self {
        Self(token.as_bytes().to_vec())
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

/// Compute the HMAC-SHA256 tag of `message`.
pub fn sign(key: &TokenKey, message: &[u8]) -> [u8; 32] {
    let mut mac = keyed_mac(key);
    mac.update(message);
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    tag
}

/// Check `tag` against the HMAC-SHA256 of `message` in constant time.
pub fn verify(key: &TokenKey, message: &[u8], tag: &[u8]) -> bool {
    let mut mac = keyed_mac(key);
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

fn keyed_mac(key: &TokenKey) -> HmacSha256 {
    HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length")
}

/// Generate a random token or challenge string.
pub fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
