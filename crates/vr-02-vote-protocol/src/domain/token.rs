//! # Token Protocol
//!
//! The frame body is a JSON envelope around a JSON payload string:
//!
//! ```text
//! {"payload": "{\"serviceName\":..,\"username\":..,\"address\":..,\"timestamp\":..,\"challenge\":..}",
//!  "signature": "<base64 HMAC-SHA256(token, payload)>"}
//! ```
//!
//! The signature covers the exact payload string bytes. The token is chosen
//! by the payload's `serviceName`, falling back to the `default` token. The
//! payload must echo the challenge from the session greeting.

use super::errors::DecodeError;
use super::frame::{token_body, wrap_token_body};
use super::session::ProtocolSession;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Value};
use shared_crypto::{sign, verify, TokenKey};
use shared_types::Vote;
use vr_01_key_store::KeyStore;

/// Authenticate and parse a complete token frame.
pub fn decode_frame(
    frame: &[u8],
    session: &ProtocolSession,
    keys: &KeyStore,
) -> Result<Vote, DecodeError> {
    let envelope = parse_object(token_body(frame)?, "envelope")?;
    let payload = string_member(&envelope, "payload")?;
    let signature = BASE64
        .decode(string_member(&envelope, "signature")?)
        .map_err(|e| DecodeError::MalformedFrame(format!("signature is not base64: {}", e)))?;

    let fields = parse_object(payload.as_bytes(), "payload")?;
    let service_name = string_member(&fields, "serviceName")?;

    let key = keys
        .resolve_token(service_name)
        .map_err(|_| DecodeError::UnknownToken(service_name.to_string()))?;
    if !verify(key, payload.as_bytes(), &signature) {
        return Err(DecodeError::IntegrityFailure("signature is not valid"));
    }
    if string_member(&fields, "challenge")? != session.challenge() {
        return Err(DecodeError::IntegrityFailure("challenge is not valid"));
    }

    Ok(Vote::new(
        service_name,
        string_member(&fields, "username")?,
        string_member(&fields, "address")?,
        timestamp_member(&fields)?,
    ))
}

/// Build the frame a listing site sends for `vote`.
pub fn encode_token(vote: &Vote, key: &TokenKey, challenge: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = json!({
        "serviceName": vote.service_name,
        "username": vote.username,
        "address": vote.address,
        "timestamp": vote.timestamp,
        "challenge": challenge,
    })
    .to_string();
    let signature = BASE64.encode(sign(key, payload.as_bytes()));
    let envelope = json!({ "payload": payload, "signature": signature }).to_string();
    wrap_token_body(envelope.as_bytes())
}

/// Positive acknowledgement line.
pub fn ack_ok() -> String {
    format!("{}\r\n", json!({ "status": "ok" }))
}

/// Negative acknowledgement line for `error`.
pub fn ack_error(error: &DecodeError) -> String {
    format!(
        "{}\r\n",
        json!({
            "status": "error",
            "cause": error.kind().as_str(),
            "error": error.to_string(),
        })
    )
}

fn parse_object(bytes: &[u8], what: &str) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DecodeError::MalformedFrame(format!(
            "{} is not a JSON object",
            what
        ))),
        Err(e) => Err(DecodeError::MalformedFrame(format!(
            "{} is not valid JSON: {}",
            what, e
        ))),
    }
}

fn string_member<'a>(
    object: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, DecodeError> {
    match object.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DecodeError::MalformedFrame(format!(
            "{} is not a string",
            name
        ))),
        None => Err(DecodeError::MissingField(name)),
    }
}

// Sites disagree on whether the timestamp is a string or a number.
fn timestamp_member(object: &Map<String, Value>) -> Result<String, DecodeError> {
    match object.get("timestamp") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(DecodeError::MalformedFrame(
            "timestamp is neither a string nor a number".to_string(),
        )),
        None => Err(DecodeError::MissingField("timestamp")),
    }
}
