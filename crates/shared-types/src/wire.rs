//! # Forwarding Wire Format
//!
//! Votes travel to backend consumers as compact JSON objects. A replay chunk
//! is the plain concatenation of its votes' objects, so a consumer reads
//! objects off the stream until it is exhausted.
//!
//! ```text
//! {"address":"..","serviceName":"..","timestamp":"..","username":".."}{"address":..}
//! ```

use crate::entities::Vote;
use crate::errors::WireError;

/// Serialize one vote for delivery.
pub fn encode_vote(vote: &Vote) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(vote).map_err(|e| WireError::Encode(e.to_string()))
}

/// Serialize a chunk of votes into a single message, preserving order.
pub fn encode_batch(votes: &[Vote]) -> Result<Vec<u8>, WireError> {
    let mut data = Vec::new();
    for vote in votes {
        serde_json::to_writer(&mut data, vote).map_err(|e| WireError::Encode(e.to_string()))?;
    }
    Ok(data)
}

/// Parse a message produced by [`encode_vote`] or [`encode_batch`].
pub fn decode_batch(data: &[u8]) -> Result<Vec<Vote>, WireError> {
    serde_json::Deserializer::from_slice(data)
        .into_iter::<Vote>()
        .map(|item| item.map_err(|e| WireError::Malformed(e.to_string())))
        .collect()
}
