//! Shared latest-frame slot
//!
//! One writer (the producer) and many readers (the sessions). Publishing
//! replaces the whole `Bytes` handle, never mutates a buffer in place, so a
//! snapshot is always a complete frame. `Bytes` is reference-counted:
//! readers get a handle to the same allocation, and a frame stays alive
//! until the last session finishes writing it out.

use bytes::Bytes;
use tokio::sync::RwLock;

/// Holder for the most recently published frame
///
/// An empty buffer means "no frame": either the producer has not published
/// yet or it has stopped and cleared the slot. Readers treat both the same
/// way and skip their send cycle.
#[derive(Debug, Default)]
pub struct FrameSlot {
    current: RwLock<Bytes>,
}

impl FrameSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents with a new frame
    pub async fn publish(&self, frame: Bytes) {
        *self.current.write().await = frame;
    }

    /// Get a handle to the latest frame (empty if none)
    pub async fn snapshot(&self) -> Bytes {
        self.current.read().await.clone()
    }

    /// Empty the slot so late readers do not serve stale imagery
    pub async fn clear(&self) {
        *self.current.write().await = Bytes::new();
    }

    /// Whether the slot currently holds a frame
    pub async fn is_empty(&self) -> bool {
        self.current.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_empty() {
        let slot = FrameSlot::new();
        assert!(slot.is_empty().await);
        assert!(slot.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_and_snapshot() {
        let slot = FrameSlot::new();
        slot.publish(Bytes::from_static(b"frame")).await;

        assert!(!slot.is_empty().await);
        assert_eq!(slot.snapshot().await, Bytes::from_static(b"frame"));
    }

    #[tokio::test]
    async fn test_snapshot_survives_replacement() {
        let slot = FrameSlot::new();
        slot.publish(Bytes::from_static(b"first")).await;

        let held = slot.snapshot().await;
        slot.publish(Bytes::from_static(b"second")).await;

        // The old snapshot is untouched by the swap.
        assert_eq!(held, Bytes::from_static(b"first"));
        assert_eq!(slot.snapshot().await, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_clear() {
        let slot = FrameSlot::new();
        slot.publish(Bytes::from_static(b"frame")).await;
        slot.clear().await;

        assert!(slot.is_empty().await);
    }
}
