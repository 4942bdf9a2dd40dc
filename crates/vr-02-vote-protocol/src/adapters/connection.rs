//! # Connection Driver
//!
//! Runs the protocol over one accepted stream:
//!
//! ```text
//! write greeting ──→ read until a frame is complete ──→ decode
//!                                                         │
//!        ┌──────────────── ok ────────────────────────────┤
//!        ▼                                                ▼ error
//! VoteReceiver::on_vote_received               [token] write error ack
//! [token] write ok ack                         VoteReceiver::on_error
//!        └───────────────→ shutdown ←─────────────────────┘
//! ```
//!
//! Listener setup and TLS belong to the host; any `AsyncRead + AsyncWrite`
//! stream works here.

use crate::domain::frame::FrameStatus;
use crate::domain::{ack_error, ack_ok, ConnectionError, DecodeError, ProtocolSession};
use crate::ports::VoteReceiver;
use crate::service::VoteCodec;
use shared_types::{ProtocolVersion, Vote};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

const READ_CHUNK: usize = 4096;

/// Connection driver settings.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Longest wait for the next bytes of a frame.
    pub read_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
        }
    }
}

impl ConnectionSettings {
    /// Short timeouts for tests.
    pub fn for_testing() -> Self {
        Self {
            read_timeout: Duration::from_millis(200),
        }
    }
}

/// Serve one inbound connection until a vote is decoded or the connection
/// fails. The stream is shut down either way.
pub async fn handle_connection<S>(
    mut stream: S,
    remote_addr: &str,
    codec: &VoteCodec,
    receiver: &dyn VoteReceiver,
    settings: &ConnectionSettings,
) -> Result<Vote, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = ProtocolSession::new();
    let result = serve(&mut stream, remote_addr, codec, receiver, settings, &mut session).await;
    session.close();

    if let Err(e) = &result {
        warn!(remote = remote_addr, error = %e, "Vote connection failed");
        receiver.on_error(e, remote_addr);
    }
    // The peer may already be gone.
    let _ = stream.shutdown().await;
    result
}

async fn serve<S>(
    stream: &mut S,
    remote_addr: &str,
    codec: &VoteCodec,
    receiver: &dyn VoteReceiver,
    settings: &ConnectionSettings,
    session: &mut ProtocolSession,
) -> Result<Vote, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(session.greeting().as_bytes()).await?;
    stream.flush().await?;

    let frame = read_frame(stream, codec, settings).await?;

    match codec.decode(&frame, session) {
        Ok(vote) => {
            let version = session.version().unwrap_or(ProtocolVersion::LegacyEncrypted);
            debug!(remote = remote_addr, %version, "Received vote");
            receiver.on_vote_received(vote.clone(), version, remote_addr);
            if version == ProtocolVersion::TokenAuthenticated {
                stream.write_all(ack_ok().as_bytes()).await?;
                stream.flush().await?;
            }
            Ok(vote)
        }
        Err(e) => {
            if session.version() == Some(ProtocolVersion::TokenAuthenticated) {
                write_negative_ack(stream, &e).await;
            }
            Err(ConnectionError::Decode(e))
        }
    }
}

async fn read_frame<S>(
    stream: &mut S,
    codec: &VoteCodec,
    settings: &ConnectionSettings,
) -> Result<Vec<u8>, ConnectionError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if let FrameStatus::Complete { len, .. } = codec.frame_status(&buf)? {
            buf.truncate(len);
            return Ok(buf);
        }

        let read = tokio::time::timeout(settings.read_timeout, stream.read(&mut chunk))
            .await
            .map_err(|_| ConnectionError::Timeout {
                received: buf.len(),
            })??;
        if read == 0 {
            return Err(ConnectionError::Incomplete {
                received: buf.len(),
            });
        }
        buf.extend_from_slice(&chunk[..read]);
    }
}

async fn write_negative_ack<S>(stream: &mut S, error: &DecodeError)
where
    S: AsyncWrite + Unpin,
{
    let line = ack_error(error);
    if let Err(e) = stream.write_all(line.as_bytes()).await {
        debug!(error = %e, "Could not send error acknowledgement");
        return;
    }
    let _ = stream.flush().await;
}
