//! # Key Store
//!
//! Immutable bundle of the legacy RSA key pair and the named token secrets.
//! A store is never mutated once built; rotation builds a new store and swaps
//! it in through [`crate::KeyStoreHandle`].

use super::errors::KeyStoreError;
use shared_crypto::{random_token, LegacyKeyPair, RsaPrivateKey, RsaPublicKey, TokenKey};
use std::collections::HashMap;

/// Token consulted when a service has no token of its own.
pub const DEFAULT_TOKEN_NAME: &str = "default";

/// Keys used to authenticate and decrypt inbound votes.
#[derive(Clone, Debug)]
pub struct KeyStore {
    legacy: LegacyKeyPair,
    tokens: HashMap<String, TokenKey>,
}

impl KeyStore {
    /// Creates a store from a key pair and a token table.
    pub fn new(legacy: LegacyKeyPair, tokens: HashMap<String, TokenKey>) -> Self {
        Self { legacy, tokens }
    }

    /// Creates a store whose tokens are given as `(name, token text)` pairs.
    pub fn from_token_strings<I, K, V>(legacy: LegacyKeyPair, tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|(name, token)| (name.into(), TokenKey::from_token(token.as_ref())))
            .collect();
        Self::new(legacy, tokens)
    }

    /// Builder method: make sure a `default` token exists.
    ///
    /// Returns the generated token text when one had to be created so the
    /// caller can hand it to the operator.
    pub fn ensure_default_token(mut self) -> (Self, Option<String>) {
        if self.tokens.contains_key(DEFAULT_TOKEN_NAME) {
            return (self, None);
        }
        let token = random_token();
        self.tokens
            .insert(DEFAULT_TOKEN_NAME.to_string(), TokenKey::from_token(&token));
        (self, Some(token))
    }

    /// Public half of the legacy key pair.
    pub fn public_key(&self) -> &RsaPublicKey {
        self.legacy.public_key()
    }

    /// Private half of the legacy key pair.
    pub fn private_key(&self) -> &RsaPrivateKey {
        self.legacy.private_key()
    }

    /// The legacy key pair.
    pub fn legacy_key_pair(&self) -> &LegacyKeyPair {
        &self.legacy
    }

    /// Legacy ciphertext block length in bytes.
    pub fn legacy_block_size(&self) -> usize {
        self.legacy.block_size()
    }

    /// Exact token lookup.
    pub fn lookup_token(&self, name: &str) -> Result<&TokenKey, KeyStoreError> {
        self.tokens
            .get(name)
            .ok_or_else(|| KeyStoreError::TokenNotFound(name.to_string()))
    }

    /// Token for a declared service name, falling back to `default`.
    pub fn resolve_token(&self, service: &str) -> Result<&TokenKey, KeyStoreError> {
        self.tokens
            .get(service)
            .or_else(|| self.tokens.get(DEFAULT_TOKEN_NAME))
            .ok_or_else(|| KeyStoreError::TokenNotFound(service.to_string()))
    }

    /// Names of all registered tokens.
    pub fn token_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}
