//! # Frame Detection
//!
//! The first two bytes of a connection decide the protocol:
//!
//! ```text
//! token:  [0x73 0x3A][len: u16 BE][len bytes of UTF-8 JSON]
//! legacy: [one RSA block, exactly the key modulus size]
//! ```
//!
//! RSA output is random, so about one legacy block in 65536 starts with the
//! token magic. Such a block is still read as legacy when exactly one block
//! is buffered, its declared token length runs past the buffer, and the byte
//! after the header is not `{`. A block whose declared length happens to fit
//! it exactly is indistinguishable from a token frame and is read as one.

use super::errors::DecodeError;
use shared_types::ProtocolVersion;

/// Magic prefix of a token-protocol frame.
pub const TOKEN_MAGIC: u16 = 0x733A;

/// Magic plus length prefix.
pub const TOKEN_HEADER_LEN: usize = 4;

/// Outcome of inspecting buffered connection bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Not enough bytes yet.
    Incomplete,
    /// A whole frame of `len` bytes is at the start of the buffer.
    Complete {
        version: ProtocolVersion,
        len: usize,
    },
}

/// Inspect `buf` for a complete frame.
///
/// `legacy_block_size` is the RSA modulus size of the current key. Bytes
/// beyond a legacy block are rejected because the legacy protocol sends
/// exactly one block per connection.
pub fn detect_frame(buf: &[u8], legacy_block_size: usize) -> Result<FrameStatus, DecodeError> {
    if buf.len() < 2 {
        return Ok(FrameStatus::Incomplete);
    }

    if u16::from_be_bytes([buf[0], buf[1]]) == TOKEN_MAGIC {
        if buf.len() < TOKEN_HEADER_LEN {
            return Ok(FrameStatus::Incomplete);
        }
        let body_len = usize::from(u16::from_be_bytes([buf[2], buf[3]]));
        let len = TOKEN_HEADER_LEN + body_len;
        if buf.len() < len {
            if buf.len() == legacy_block_size && buf[TOKEN_HEADER_LEN] != b'{' {
                return Ok(FrameStatus::Complete {
                    version: ProtocolVersion::LegacyEncrypted,
                    len: buf.len(),
                });
            }
            return Ok(FrameStatus::Incomplete);
        }
        return Ok(FrameStatus::Complete {
            version: ProtocolVersion::TokenAuthenticated,
            len,
        });
    }

    match buf.len() {
        n if n < legacy_block_size => Ok(FrameStatus::Incomplete),
        n if n == legacy_block_size => Ok(FrameStatus::Complete {
            version: ProtocolVersion::LegacyEncrypted,
            len: n,
        }),
        n => Err(DecodeError::MalformedFrame(format!(
            "received {} bytes, legacy vote block is {} bytes",
            n, legacy_block_size
        ))),
    }
}

/// Version a complete frame was sent in. A token frame carries exactly the
/// body length its header declares.
pub fn frame_version(frame: &[u8]) -> ProtocolVersion {
    let is_token = frame.len() >= TOKEN_HEADER_LEN
        && u16::from_be_bytes([frame[0], frame[1]]) == TOKEN_MAGIC
        && usize::from(u16::from_be_bytes([frame[2], frame[3]])) == frame.len() - TOKEN_HEADER_LEN;
    if is_token {
        ProtocolVersion::TokenAuthenticated
    } else {
        ProtocolVersion::LegacyEncrypted
    }
}

/// JSON body of a complete token frame.
pub fn token_body(frame: &[u8]) -> Result<&[u8], DecodeError> {
    if frame.len() < TOKEN_HEADER_LEN
        || u16::from_be_bytes([frame[0], frame[1]]) != TOKEN_MAGIC
    {
        return Err(DecodeError::MalformedFrame(
            "token frame header missing".to_string(),
        ));
    }
    let body_len = usize::from(u16::from_be_bytes([frame[2], frame[3]]));
    let body = &frame[TOKEN_HEADER_LEN..];
    if body.len() != body_len {
        return Err(DecodeError::MalformedFrame(format!(
            "token frame declares {} bytes, carries {}",
            body_len,
            body.len()
        )));
    }
    Ok(body)
}

/// Wrap a JSON body in a token frame header.
pub fn wrap_token_body(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = u16::try_from(body.len()).map_err(|_| {
        DecodeError::MalformedFrame(format!("token frame body too large: {} bytes", body.len()))
    })?;
    let mut frame = Vec::with_capacity(TOKEN_HEADER_LEN + body.len());
    frame.extend_from_slice(&TOKEN_MAGIC.to_be_bytes());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}
