//! Feed client
//!
//! Thin consumer of the wire protocol: connect, then read length-prefixed
//! frames. Decoding and display belong to the embedding application.

pub mod receiver;

pub use receiver::FeedReceiver;
