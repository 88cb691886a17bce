//! Length-prefixed frame encoding and decoding
//!
//! Protocol v1: each message is an 8-byte unsigned big-endian length
//! followed by exactly that many bytes of JPEG payload. The prefix width is
//! fixed at 8 bytes; readers and writers must agree on it, so it is part of
//! the protocol version rather than a tunable.
//!
//! Zero-length messages are never sent: a session with no frame available
//! simply skips its cycle. Readers therefore treat an announced length of
//! zero as a protocol violation.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, ProtocolError, Result};

/// Width of the length prefix in bytes
pub const LENGTH_PREFIX_LEN: usize = 8;

/// Default upper bound a reader accepts for a single frame
///
/// Encoded frames are single JPEG images; anything near this limit is a
/// corrupt or hostile prefix, not a real frame.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Encode a payload as one contiguous wire message.
///
/// The result holds the length prefix and payload in a single buffer so the
/// caller can issue it as one logical write. Empty payloads are rejected;
/// the protocol never carries them.
pub fn encode_frame(payload: &Bytes) -> Result<Bytes> {
    if payload.is_empty() {
        return Err(Error::Protocol(ProtocolError::EmptyFrame));
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    buf.put_u64(payload.len() as u64);
    buf.extend_from_slice(payload);
    Ok(buf.freeze())
}

/// Read one frame from the stream.
///
/// Reassembles the payload across however many socket reads it takes.
/// An announced length of zero or beyond `max_len` is a
/// [`ProtocolError`]; a connection that closes after the prefix but before
/// the full payload yields [`ProtocolError::TruncatedFrame`]. An error
/// while reading the prefix itself (including a clean close between
/// frames) surfaces as [`Error::Io`].
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    reader.read_exact(&mut prefix).await?;

    let length = u64::from_be_bytes(prefix);
    if length == 0 {
        return Err(Error::Protocol(ProtocolError::EmptyFrame));
    }
    if length > max_len as u64 {
        return Err(Error::Protocol(ProtocolError::OversizedFrame {
            length,
            limit: max_len,
        }));
    }

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Protocol(ProtocolError::TruncatedFrame)
        } else {
            Error::Io(e)
        }
    })?;

    Ok(Bytes::from(payload))
}
