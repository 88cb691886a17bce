//! Wire protocol for frame delivery
//!
//! The protocol is server-to-client only: after the TCP connect there is no
//! handshake and the client sends nothing. See [`framing`] for the message
//! layout.

pub mod framing;

pub use framing::{encode_frame, read_frame, DEFAULT_MAX_FRAME_LEN, LENGTH_PREFIX_LEN};
