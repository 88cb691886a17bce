//! Frame source abstraction
//!
//! The capture/encode pipeline is an external collaborator: the producer
//! only needs something it can pull encoded frames from. A source reports
//! end-of-stream by yielding `None`, which the producer answers with a
//! rewind rather than a shutdown, so finite sources (a looping clip) play
//! forever.
//!
//! Implementations are expected to deliver frames already resized and
//! compressed to the [`SourceConfig`] they were opened with.

pub mod replay;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};

pub use replay::{ReplayFeed, ReplaySource};

/// Configuration for one producer run
///
/// Set once when the producer starts and immutable for that run's lifetime.
/// Every field is explicit and range-checked; there is no by-name override
/// mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Capture device or file identifier
    pub source: String,

    /// Output frame width in pixels
    pub width: u32,

    /// Output frame height in pixels
    pub height: u32,

    /// Target frame rate when the source does not report its own
    pub fps: u32,

    /// JPEG encode quality (1-100)
    pub quality: u8,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source: "0".to_string(),
            width: 1280,
            height: 720,
            fps: 30,
            quality: 85,
        }
    }
}

impl SourceConfig {
    /// Set the device or file identifier
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the output dimensions
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the target frame rate
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the JPEG encode quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Check all values against their allowed ranges
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "output size {}x{} must be nonzero",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > 240 {
            return Err(Error::InvalidConfig(format!(
                "fps {} outside 1..=240",
                self.fps
            )));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(Error::InvalidConfig(format!(
                "quality {} outside 1..=100",
                self.quality
            )));
        }
        Ok(())
    }

    /// Frame interval implied by the configured rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }
}

/// A pull source of encoded frames
///
/// `Ok(None)` from [`next_frame`](FrameSource::next_frame) means end of
/// stream. It is never fatal; the caller rewinds and keeps pulling.
pub trait FrameSource: Send + 'static {
    /// Pull the next encoded frame, or `None` at end of stream
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;

    /// Reset the source to its start
    fn rewind(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Release the underlying device or file
    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// The source's own frame interval, when it reports one
    ///
    /// The producer paces by this when available, falling back to the
    /// configured rate otherwise.
    fn native_interval(&self) -> Option<Duration> {
        None
    }
}

/// Opens a [`FrameSource`] for a producer run
///
/// A failed open is [`Error::SourceUnavailable`]; the producer retries it
/// rather than giving up, since the source may recover.
pub trait FrameSourceFactory: Send + Sync + 'static {
    /// The source type this factory opens
    type Source: FrameSource;

    /// Open the source with the given configuration
    fn open(&self, config: &SourceConfig) -> impl Future<Output = Result<Self::Source>> + Send;
}
