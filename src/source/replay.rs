//! Replay source: a fixed set of frames played on a loop
//!
//! Stands in for a looping video file. The source reports end-of-stream
//! after the last frame, so the producer's rewind path gets exercised on
//! every pass through the set. Used by the demo binaries and throughout the
//! test suite.

use std::time::Duration;

use bytes::Bytes;

use super::{FrameSource, FrameSourceFactory, SourceConfig};
use crate::error::{Error, Result};

/// Factory producing [`ReplaySource`] instances from a fixed frame set
///
/// `Bytes` frames are reference-counted, so each opened source shares the
/// underlying buffers with the factory.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    frames: Vec<Bytes>,
    native_interval: Option<Duration>,
}

impl ReplayFeed {
    /// Create a feed over a set of pre-encoded frames
    pub fn new(frames: Vec<Bytes>) -> Self {
        Self {
            frames,
            native_interval: None,
        }
    }

    /// Report a native frame interval to the producer, as a real capture
    /// device would
    pub fn native_interval(mut self, interval: Duration) -> Self {
        self.native_interval = Some(interval);
        self
    }
}

impl FrameSourceFactory for ReplayFeed {
    type Source = ReplaySource;

    async fn open(&self, config: &SourceConfig) -> Result<ReplaySource> {
        if self.frames.is_empty() {
            return Err(Error::SourceUnavailable(format!(
                "replay feed {:?} has no frames",
                config.source
            )));
        }

        Ok(ReplaySource {
            frames: self.frames.clone(),
            position: 0,
            native_interval: self.native_interval,
        })
    }
}

/// One opened replay pass-through
#[derive(Debug)]
pub struct ReplaySource {
    frames: Vec<Bytes>,
    position: usize,
    native_interval: Option<Duration>,
}

impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.position == self.frames.len() {
            return Ok(None);
        }

        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(Some(frame))
    }

    async fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }

    fn native_interval(&self) -> Option<Duration> {
        self.native_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> Vec<Bytes> {
        vec![
            Bytes::from_static(b"\xff\xd8one\xff\xd9"),
            Bytes::from_static(b"\xff\xd8two\xff\xd9"),
        ]
    }

    #[tokio::test]
    async fn test_plays_through_then_signals_eos() {
        let feed = ReplayFeed::new(frames());
        let mut source = feed.open(&SourceConfig::default()).await.unwrap();

        assert_eq!(
            source.next_frame().await.unwrap().unwrap(),
            frames()[0]
        );
        assert_eq!(
            source.next_frame().await.unwrap().unwrap(),
            frames()[1]
        );
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewind_restarts_the_set() {
        let feed = ReplayFeed::new(frames());
        let mut source = feed.open(&SourceConfig::default()).await.unwrap();

        while source.next_frame().await.unwrap().is_some() {}
        source.rewind().await.unwrap();

        assert_eq!(
            source.next_frame().await.unwrap().unwrap(),
            frames()[0]
        );
    }

    #[tokio::test]
    async fn test_empty_feed_is_unavailable() {
        let feed = ReplayFeed::new(Vec::new());
        let result = feed.open(&SourceConfig::default()).await;

        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_native_interval_reported() {
        let feed = ReplayFeed::new(frames()).native_interval(Duration::from_millis(40));
        let source = feed.open(&SourceConfig::default()).await.unwrap();

        assert_eq!(source.native_interval(), Some(Duration::from_millis(40)));
    }
}
