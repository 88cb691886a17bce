//! Frame producer
//!
//! Converts a pull-based [`FrameSource`] into a continuously fresh shared
//! frame. The producer runs one background task that pulls, publishes into
//! the [`FrameSlot`], and paces itself to the source's rate. It starts and
//! stops on demand; the session registry is the only caller of
//! [`start`](FrameProducer::start) and [`stop`](FrameProducer::stop).

pub mod slot;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::source::{FrameSource, FrameSourceFactory, SourceConfig};

pub use slot::FrameSlot;

/// Back-off between attempts to open or read a failing source
const SOURCE_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Background producer refreshing the shared frame from a source
pub struct FrameProducer<F: FrameSourceFactory> {
    factory: Arc<F>,
    slot: Arc<FrameSlot>,
    running: AtomicBool,
    interval_nanos: AtomicU64,
    stop_signal: Notify,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<F: FrameSourceFactory> FrameProducer<F> {
    /// Create a stopped producer over the given source factory
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            slot: Arc::new(FrameSlot::new()),
            running: AtomicBool::new(false),
            interval_nanos: AtomicU64::new(
                SourceConfig::default().frame_interval().as_nanos() as u64,
            ),
            stop_signal: Notify::new(),
            task: Mutex::new(None),
        }
    }

    /// Start the encode loop with the given configuration.
    ///
    /// Idempotent: a running producer ignores the call. The pacing interval
    /// is derived from the configured rate immediately and refined to the
    /// source's native rate once the source is open.
    pub async fn start(self: &Arc<Self>, config: SourceConfig) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        self.set_interval(config.frame_interval());

        let producer = Arc::clone(self);
        let handle = tokio::spawn(async move {
            producer.run_loop(config).await;
        });
        *self.task.lock().await = Some(handle);
    }

    /// Stop the encode loop.
    ///
    /// The loop observes the flag at its next iteration boundary, closes
    /// the source, and clears the slot; this call waits for that teardown
    /// so a subsequent [`start`](FrameProducer::start) never races a stale
    /// run. Idempotent.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.stop_signal.notify_waiters();

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Producer task did not shut down cleanly");
            }
        }
    }

    /// Whether the encode loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current pacing interval (native source rate when known, configured
    /// rate otherwise)
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Relaxed))
    }

    /// Handle to the latest published frame
    pub async fn snapshot(&self) -> Bytes {
        self.slot.snapshot().await
    }

    /// The shared frame slot
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    fn set_interval(&self, interval: Duration) {
        self.interval_nanos
            .store(interval.as_nanos() as u64, Ordering::Relaxed);
    }

    async fn run_loop(self: Arc<Self>, config: SourceConfig) {
        let mut source = match self.open_source(&config).await {
            Some(source) => source,
            None => {
                // Stopped before the source ever opened.
                self.slot.clear().await;
                return;
            }
        };

        if let Some(native) = source.native_interval() {
            self.set_interval(native);
        }

        tracing::info!(
            source = %config.source,
            width = config.width,
            height = config.height,
            fps = config.fps,
            quality = config.quality,
            "Frame producer running"
        );

        while self.running.load(Ordering::SeqCst) {
            let started = Instant::now();

            match source.next_frame().await {
                Ok(Some(frame)) => {
                    if !frame.is_empty() {
                        self.slot.publish(frame).await;
                    }
                }
                Ok(None) => {
                    tracing::debug!("Frame source at end of stream, rewinding");
                    if let Err(e) = source.rewind().await {
                        tracing::warn!(error = %e, "Frame source rewind failed");
                        self.pause(SOURCE_RETRY_DELAY).await;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Frame source read failed");
                    self.pause(SOURCE_RETRY_DELAY).await;
                    continue;
                }
            }

            let remaining = self.frame_interval().saturating_sub(started.elapsed());
            if !remaining.is_zero() {
                self.pause(remaining).await;
            }
        }

        source.close().await;
        self.slot.clear().await;
        tracing::info!("Frame producer stopped");
    }

    /// Open the source, retrying while the producer is still wanted.
    ///
    /// Returns `None` if the producer was stopped before an open succeeded.
    async fn open_source(&self, config: &SourceConfig) -> Option<F::Source> {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return None;
            }

            match self.factory.open(config).await {
                Ok(source) => return Some(source),
                Err(e) => {
                    tracing::warn!(
                        source = %config.source,
                        error = %e,
                        "Frame source unavailable, retrying"
                    );
                    self.pause(SOURCE_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Sleep that a concurrent [`stop`](FrameProducer::stop) can cut short
    async fn pause(&self, delay: Duration) {
        tokio::select! {
            _ = self.stop_signal.notified() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::error::{Error, Result};
    use crate::source::ReplayFeed;

    fn frames() -> Vec<Bytes> {
        vec![
            Bytes::from_static(b"\xff\xd8one\xff\xd9"),
            Bytes::from_static(b"\xff\xd8two\xff\xd9"),
        ]
    }

    fn fast_config() -> SourceConfig {
        SourceConfig::default().fps(200)
    }

    async fn wait_for_frame<F: FrameSourceFactory>(producer: &FrameProducer<F>) -> Bytes {
        for _ in 0..200 {
            let frame = producer.snapshot().await;
            if !frame.is_empty() {
                return frame;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("producer never published a frame");
    }

    #[tokio::test]
    async fn test_start_publishes_and_loops_past_eos() {
        let producer = Arc::new(FrameProducer::new(ReplayFeed::new(frames())));
        producer.start(fast_config()).await;

        assert!(producer.is_running());

        // The replay set is two frames long; seeing frames repeatedly
        // means the producer survived end-of-stream and rewound.
        for _ in 0..10 {
            let frame = wait_for_frame(&producer).await;
            assert!(frames().contains(&frame));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        producer.stop().await;
    }

    #[tokio::test]
    async fn test_stop_clears_slot() {
        let producer = Arc::new(FrameProducer::new(ReplayFeed::new(frames())));
        producer.start(fast_config()).await;
        wait_for_frame(&producer).await;

        producer.stop().await;

        assert!(!producer.is_running());
        // stop() waits for the loop teardown, so the clear has happened.
        assert!(producer.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let producer = Arc::new(FrameProducer::new(ReplayFeed::new(frames())));
        producer.stop().await;
        producer.stop().await;
        assert!(!producer.is_running());
    }

    struct CountingFeed {
        opens: Arc<AtomicUsize>,
    }

    impl FrameSourceFactory for CountingFeed {
        type Source = crate::source::ReplaySource;

        async fn open(&self, config: &SourceConfig) -> Result<Self::Source> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            ReplayFeed::new(frames()).open(config).await
        }
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let opens = Arc::new(AtomicUsize::new(0));
        let producer = Arc::new(FrameProducer::new(CountingFeed {
            opens: Arc::clone(&opens),
        }));

        producer.start(fast_config()).await;
        producer.start(fast_config()).await;
        producer.start(fast_config()).await;
        wait_for_frame(&producer).await;

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        producer.stop().await;
    }

    struct BrokenFeed {
        opens: Arc<AtomicUsize>,
    }

    impl FrameSourceFactory for BrokenFeed {
        type Source = crate::source::ReplaySource;

        async fn open(&self, _config: &SourceConfig) -> Result<Self::Source> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Err(Error::SourceUnavailable("device is gone".into()))
        }
    }

    #[tokio::test]
    async fn test_open_failure_is_retried_not_fatal() {
        let opens = Arc::new(AtomicUsize::new(0));
        let producer = Arc::new(FrameProducer::new(BrokenFeed {
            opens: Arc::clone(&opens),
        }));

        producer.start(fast_config()).await;
        tokio::time::sleep(SOURCE_RETRY_DELAY * 3).await;

        assert!(producer.is_running());
        assert!(opens.load(Ordering::SeqCst) >= 2);

        producer.stop().await;
        assert!(!producer.is_running());
    }

    #[tokio::test]
    async fn test_native_interval_overrides_configured_rate() {
        let feed = ReplayFeed::new(frames()).native_interval(Duration::from_millis(40));
        let producer = Arc::new(FrameProducer::new(feed));

        producer.start(fast_config()).await;
        wait_for_frame(&producer).await;

        assert_eq!(producer.frame_interval(), Duration::from_millis(40));
        producer.stop().await;
    }
}
