//! # Key Files
//!
//! The legacy key pair lives in a directory as two base64 text files:
//!
//! ```text
//! <dir>/public.key   base64(DER SubjectPublicKeyInfo)
//! <dir>/private.key  base64(DER PKCS#8 PrivateKeyInfo)
//! ```
//!
//! A missing directory means first start: a pair is generated and saved so
//! vote-listing sites can be given the public key.

use crate::domain::KeyStoreError;
use shared_crypto::LegacyKeyPair;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// File name of the public key inside the key directory.
pub const PUBLIC_KEY_FILE: &str = "public.key";
/// File name of the private key inside the key directory.
pub const PRIVATE_KEY_FILE: &str = "private.key";

/// Load the pair stored in `dir`.
pub fn load_key_pair(dir: &Path) -> Result<LegacyKeyPair, KeyStoreError> {
    let public = read_text(&dir.join(PUBLIC_KEY_FILE))?;
    let private = read_text(&dir.join(PRIVATE_KEY_FILE))?;
    Ok(LegacyKeyPair::from_base64(&public, &private)?)
}

/// Save `pair` into `dir`, creating the directory if needed.
pub fn save_key_pair(dir: &Path, pair: &LegacyKeyPair) -> Result<(), KeyStoreError> {
    fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;
    let (public, private) = pair.to_base64()?;
    write_text(&dir.join(PUBLIC_KEY_FILE), &public)?;
    write_text(&dir.join(PRIVATE_KEY_FILE), &private)?;
    Ok(())
}

/// Load the pair in `dir`, or generate and save one of `bits` if the
/// directory does not exist yet.
pub fn load_or_generate(dir: &Path, bits: usize) -> Result<LegacyKeyPair, KeyStoreError> {
    if dir.exists() {
        return load_key_pair(dir);
    }

    warn!(dir = %dir.display(), bits, "No RSA key pair found, generating a new one");
    let pair = LegacyKeyPair::generate(bits)?;
    save_key_pair(dir, &pair)?;
    info!(dir = %dir.display(), "Saved new RSA key pair");
    Ok(pair)
}

fn read_text(path: &Path) -> Result<String, KeyStoreError> {
    fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn write_text(path: &Path, text: &str) -> Result<(), KeyStoreError> {
    fs::write(path, text).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> KeyStoreError {
    KeyStoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
