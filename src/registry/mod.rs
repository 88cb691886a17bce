//! Session registry
//!
//! Single source of truth for "is anyone listening". The roster and the
//! active count live behind one mutex, and the producer start/stop decision
//! is made under that same lock acquisition: two sessions joining
//! back-to-back cannot double-start the producer, and every transition
//! check sees the count it just wrote. The registry is the only writer of
//! the producer's running state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::producer::FrameProducer;
use crate::source::{FrameSourceFactory, SourceConfig};

/// Roster and count, mutated as one unit
#[derive(Debug, Default)]
struct Roster {
    active: usize,
    peers: Vec<String>,
}

/// Point-in-time view of the roster, for observability
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    /// Number of registered sessions
    pub active: usize,
    /// Peer identities (`host:port`) in join order
    pub peers: Vec<String>,
}

/// Tracks connected sessions and gates the producer's lifecycle
pub struct SessionRegistry<F: FrameSourceFactory> {
    producer: Arc<FrameProducer<F>>,
    source_config: SourceConfig,
    roster: Mutex<Roster>,
}

impl<F: FrameSourceFactory> SessionRegistry<F> {
    /// Create a registry driving the given producer.
    ///
    /// `source_config` is handed to the producer on every 0→1 start.
    pub fn new(producer: Arc<FrameProducer<F>>, source_config: SourceConfig) -> Self {
        Self {
            producer,
            source_config,
            roster: Mutex::new(Roster::default()),
        }
    }

    /// Register a session.
    ///
    /// The first join starts the producer with the configured source
    /// parameters.
    pub async fn join(&self, peer: &str) {
        let mut roster = self.roster.lock().await;
        roster.peers.push(peer.to_string());
        roster.active += 1;

        if roster.active == 1 {
            self.producer.start(self.source_config.clone()).await;
        }

        tracing::info!(
            active = roster.active,
            peers = ?roster.peers,
            "Session joined"
        );
    }

    /// Deregister a session.
    ///
    /// The count never goes below zero. The last leave stops the producer,
    /// which clears the shared frame on its way out.
    pub async fn leave(&self, peer: &str) {
        let mut roster = self.roster.lock().await;
        if let Some(pos) = roster.peers.iter().position(|p| p == peer) {
            roster.peers.remove(pos);
        }
        roster.active = roster.active.saturating_sub(1);

        if roster.active == 0 {
            self.producer.stop().await;
        }

        tracing::info!(
            active = roster.active,
            peers = ?roster.peers,
            "Session left"
        );
    }

    /// Number of currently registered sessions
    pub async fn active_count(&self) -> usize {
        self.roster.lock().await.active
    }

    /// Snapshot of the roster for observability
    pub async fn snapshot(&self) -> RosterSnapshot {
        let roster = self.roster.lock().await;
        RosterSnapshot {
            active: roster.active,
            peers: roster.peers.clone(),
        }
    }

    /// Drop every registration and stop the producer.
    ///
    /// Used at server shutdown, where sessions are torn down without
    /// running their own leave path.
    pub async fn drain(&self) {
        let mut roster = self.roster.lock().await;
        if roster.active > 0 {
            tracing::info!(dropped = roster.active, "Draining session registry");
        }
        roster.peers.clear();
        roster.active = 0;
        self.producer.stop().await;
    }

    /// The producer this registry controls
    pub fn producer(&self) -> &Arc<FrameProducer<F>> {
        &self.producer
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::error::Result;
    use crate::source::{ReplayFeed, ReplaySource};

    fn frames() -> Vec<Bytes> {
        vec![Bytes::from_static(b"\xff\xd8frame\xff\xd9")]
    }

    struct CountingFeed {
        opens: Arc<AtomicUsize>,
    }

    impl FrameSourceFactory for CountingFeed {
        type Source = ReplaySource;

        async fn open(&self, config: &SourceConfig) -> Result<ReplaySource> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            ReplayFeed::new(frames()).open(config).await
        }
    }

    fn counting_registry() -> (Arc<SessionRegistry<CountingFeed>>, Arc<AtomicUsize>) {
        let opens = Arc::new(AtomicUsize::new(0));
        let producer = Arc::new(FrameProducer::new(CountingFeed {
            opens: Arc::clone(&opens),
        }));
        let registry = Arc::new(SessionRegistry::new(
            producer,
            SourceConfig::default().fps(200),
        ));
        (registry, opens)
    }

    #[tokio::test]
    async fn test_first_join_starts_last_leave_stops() {
        let (registry, _) = counting_registry();

        registry.join("10.0.0.5:4000").await;
        assert!(registry.producer().is_running());
        assert_eq!(registry.active_count().await, 1);

        registry.join("10.0.0.6:4000").await;
        assert_eq!(registry.active_count().await, 2);

        registry.leave("10.0.0.5:4000").await;
        assert!(registry.producer().is_running());

        registry.leave("10.0.0.6:4000").await;
        assert_eq!(registry.active_count().await, 0);
        assert!(!registry.producer().is_running());
    }

    #[tokio::test]
    async fn test_concurrent_joins_start_producer_once() {
        let (registry, opens) = counting_registry();

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.join(&format!("10.0.0.{i}:4000")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.active_count().await, 8);
        assert!(registry.producer().is_running());

        // Let the producer task reach its open.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(opens.load(Ordering::SeqCst), 1);

        for i in 0..8 {
            registry.leave(&format!("10.0.0.{i}:4000")).await;
        }
        assert_eq!(registry.active_count().await, 0);
        assert!(!registry.producer().is_running());
    }

    #[tokio::test]
    async fn test_interleaved_join_leave_settles_at_zero() {
        let (registry, _) = counting_registry();

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let peer = format!("192.168.0.{i}:5000");
                registry.join(&peer).await;
                tokio::task::yield_now().await;
                registry.leave(&peer).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.active, 0);
        assert!(snapshot.peers.is_empty());
        assert!(!registry.producer().is_running());
    }

    #[tokio::test]
    async fn test_leave_of_unknown_peer_floors_at_zero() {
        let (registry, _) = counting_registry();

        registry.leave("1.2.3.4:9999").await;

        assert_eq!(registry.active_count().await, 0);
        assert!(!registry.producer().is_running());
    }

    #[tokio::test]
    async fn test_snapshot_lists_peers_in_join_order() {
        let (registry, _) = counting_registry();

        registry.join("10.0.0.5:4000").await;
        registry.join("10.0.0.6:4001").await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.peers, vec!["10.0.0.5:4000", "10.0.0.6:4001"]);

        registry.drain().await;
    }

    #[tokio::test]
    async fn test_drain_clears_everything() {
        let (registry, _) = counting_registry();

        registry.join("10.0.0.5:4000").await;
        registry.join("10.0.0.6:4001").await;
        registry.drain().await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.active, 0);
        assert!(snapshot.peers.is_empty());
        assert!(!registry.producer().is_running());
    }
}
