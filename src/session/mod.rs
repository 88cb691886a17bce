//! Per-client broadcast sessions
//!
//! One session per accepted connection, from registration to disconnect.

pub mod broadcast;

pub use broadcast::BroadcastSession;
