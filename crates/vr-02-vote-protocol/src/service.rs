//! # Vote Codec Service
//!
//! Stateless decoder over the shared key store. Each call takes a key store
//! snapshot, so a rotation during a decode does not affect it.
//!
//! Decoding is dispatched through a table of strategies indexed by
//! [`ProtocolVersion`]; the version is read from the frame once and pinned
//! on the session.

use crate::domain::frame::{detect_frame, frame_version, FrameStatus};
use crate::domain::{legacy, token, DecodeError, ProtocolSession};
use shared_types::{ProtocolVersion, Vote};
use tracing::debug;
use vr_01_key_store::{KeyStore, KeyStoreHandle};

type DecodeStrategy = fn(&[u8], &ProtocolSession, &KeyStore) -> Result<Vote, DecodeError>;

/// Decode strategies, indexed by `ProtocolVersion as usize`.
const STRATEGIES: [DecodeStrategy; 2] = [
    legacy::decode_frame, // LegacyEncrypted
    token::decode_frame,  // TokenAuthenticated
];

fn strategy_for(version: ProtocolVersion) -> DecodeStrategy {
    STRATEGIES[version as usize]
}

/// Decodes inbound frames for any number of connections.
#[derive(Clone, Debug)]
pub struct VoteCodec {
    keys: KeyStoreHandle,
}

impl VoteCodec {
    pub fn new(keys: KeyStoreHandle) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &KeyStoreHandle {
        &self.keys
    }

    /// Check whether `buf` holds a complete frame yet.
    pub fn frame_status(&self, buf: &[u8]) -> Result<FrameStatus, DecodeError> {
        detect_frame(buf, self.keys.snapshot().legacy_block_size())
    }

    /// Decode one complete frame.
    ///
    /// On success the session is negotiated; on any failure it is closed.
    pub fn decode(&self, frame: &[u8], session: &mut ProtocolSession) -> Result<Vote, DecodeError> {
        if session.is_closed() {
            return Err(DecodeError::SessionClosed);
        }

        let keys = self.keys.snapshot();
        let result = decode_with(frame, session, &keys);

        match &result {
            Ok(vote) => debug!(%vote, "Decoded vote"),
            Err(e) => {
                debug!(error = %e, kind = %e.kind(), "Rejected vote frame");
                session.close();
            }
        }
        result
    }
}

fn decode_with(
    frame: &[u8],
    session: &mut ProtocolSession,
    keys: &KeyStore,
) -> Result<Vote, DecodeError> {
    let version = frame_version(frame);
    session.select_version(version)?;
    let vote = strategy_for(version)(frame, session, keys)?;
    session.negotiate()?;
    Ok(vote)
}
