//! Feed server
//!
//! Handles the boundary between the network and the session layer: TCP
//! accept loop, address filtering, and session spawning.

pub mod config;
pub mod filter;
pub mod listener;

pub use config::ServerConfig;
pub use filter::AddressFilter;
pub use listener::FeedServer;
