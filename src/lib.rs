//! Live frame broadcast over length-prefixed TCP
//!
//! `framecast` distributes a continuously-updating compressed image (a
//! "frame") from a single capture source to any number of connected TCP
//! clients. The capture source only runs while at least one client is
//! attached.
//!
//! # Architecture
//!
//! ```text
//!   FrameSource ──► FrameProducer ──► FrameSlot (latest frame)
//!                                        │
//!                        ┌───────────────┼───────────────┐
//!                        ▼               ▼               ▼
//!                 BroadcastSession BroadcastSession BroadcastSession
//!                        │               │               │
//!                        └──► TCP        └──► TCP        └──► TCP
//! ```
//!
//! Data flows one direction: source → producer → slot → sessions. Control
//! flows the other way: the [`FeedServer`](server::FeedServer) accepts
//! connections and spawns sessions; sessions register with the
//! [`SessionRegistry`](registry::SessionRegistry); the registry starts the
//! producer when the first session joins and stops it when the last one
//! leaves.
//!
//! # Wire protocol
//!
//! Each message is an 8-byte unsigned big-endian length followed by that
//! many bytes of JPEG-encoded image data. See [`protocol::framing`].
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use framecast::{FeedServer, ReplayFeed, ServerConfig};
//!
//! # async fn example() -> framecast::Result<()> {
//! let frames = vec![Bytes::from_static(b"\xff\xd8fake jpeg\xff\xd9")];
//! let config = ServerConfig::default().bind("0.0.0.0:6666".parse().unwrap());
//! let server = FeedServer::new(config, ReplayFeed::new(frames))?;
//! server.run().await
//! # }
//! ```

pub mod client;
pub mod error;
pub mod producer;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod source;
pub mod stats;

pub use client::FeedReceiver;
pub use error::{Error, Result};
pub use producer::{FrameProducer, FrameSlot};
pub use registry::{RosterSnapshot, SessionRegistry};
pub use server::{AddressFilter, FeedServer, ServerConfig};
pub use source::{FrameSource, FrameSourceFactory, ReplayFeed, ReplaySource, SourceConfig};
