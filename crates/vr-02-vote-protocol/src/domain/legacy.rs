//! # Legacy Protocol
//!
//! One RSA PKCS#1 v1.5 block per connection. The plaintext is UTF-8 with
//! five newline-separated fields:
//!
//! ```text
//! VOTE\n<serviceName>\n<username>\n<address>\n<timestamp>\n
//! ```
//!
//! Trailing empty lines are ignored. There is no acknowledgement channel.

use super::errors::DecodeError;
use super::session::ProtocolSession;
use shared_crypto::{decrypt_block, encrypt_block, CryptoError, RsaPublicKey};
use shared_types::Vote;
use vr_01_key_store::KeyStore;

/// Literal first field of every legacy vote.
pub const OPCODE: &str = "VOTE";

/// Field names in wire order.
const FIELDS: [&str; 5] = ["opcode", "serviceName", "username", "address", "timestamp"];

/// Decrypt and parse a legacy block.
pub fn decode_frame(
    block: &[u8],
    _session: &ProtocolSession,
    keys: &KeyStore,
) -> Result<Vote, DecodeError> {
    let plaintext = decrypt_block(keys.private_key(), block)
        .map_err(|e| DecodeError::DecryptFailure(e.to_string()))?;
    parse_plaintext(&plaintext)
}

/// Parse decrypted legacy plaintext.
pub fn parse_plaintext(plaintext: &[u8]) -> Result<Vote, DecodeError> {
    let text = std::str::from_utf8(plaintext).map_err(|_| {
        DecodeError::MalformedFrame("legacy vote plaintext is not UTF-8".to_string())
    })?;

    let mut fields: Vec<&str> = text.split('\n').collect();
    while fields.last() == Some(&"") {
        fields.pop();
    }

    let opcode = fields.first().copied().unwrap_or_default();
    if opcode != OPCODE {
        return Err(DecodeError::BadOpcode(opcode.to_string()));
    }
    if fields.len() < FIELDS.len() {
        return Err(DecodeError::MissingField(FIELDS[fields.len()]));
    }
    if fields.len() > FIELDS.len() {
        return Err(DecodeError::TooManyFields(fields.len()));
    }

    Ok(Vote::new(fields[1], fields[2], fields[3], fields[4]))
}

/// Legacy plaintext for `vote`.
pub fn plaintext(vote: &Vote) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n",
        OPCODE, vote.service_name, vote.username, vote.address, vote.timestamp
    )
}

/// Encrypt `vote` the way a listing site does.
pub fn encode_legacy(vote: &Vote, public: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    encrypt_block(public, plaintext(vote).as_bytes())
}
