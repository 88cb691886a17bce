//! Crate-wide error types
//!
//! The taxonomy separates recoverable conditions from session-fatal ones:
//! a [`SourceUnavailable`](Error::SourceUnavailable) source is retried by
//! the producer, while I/O and protocol errors terminate exactly one
//! session. A peer rejected by the address filter is never surfaced as an
//! error value at all; the listener logs it and closes the socket.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// The frame source could not be opened or read. Recoverable: the
    /// producer logs and retries rather than shutting down.
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Socket I/O failed; terminal for the session it occurred on
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A socket operation did not complete within the connection deadline
    #[error("connection deadline elapsed")]
    DeadlineElapsed,

    /// The byte stream violated the wire protocol
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Wire protocol violations
///
/// Only observable on the reading side; the server never emits these
/// framings. A conforming reader treats all of them as session-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A zero-length frame was announced (never sent by a conforming peer)
    #[error("zero-length frame")]
    EmptyFrame,

    /// The announced length exceeds the reader's limit
    #[error("announced frame length {length} exceeds limit {limit}")]
    OversizedFrame {
        /// Length announced by the prefix
        length: u64,
        /// Reader's configured maximum
        limit: usize,
    },

    /// The connection closed before the announced payload arrived
    #[error("connection closed mid-frame")]
    TruncatedFrame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SourceUnavailable("no such device".into());
        assert_eq!(err.to_string(), "frame source unavailable: no such device");

        let err = Error::Protocol(ProtocolError::OversizedFrame {
            length: 1 << 40,
            limit: 64 * 1024 * 1024,
        });
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
