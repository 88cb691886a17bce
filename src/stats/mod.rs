//! Session statistics

use std::time::{Duration, Instant};

/// Counters for one broadcast session
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Frames written to the client
    pub frames_sent: u64,
    /// Total bytes written, including length prefixes
    pub bytes_sent: u64,
    /// When the session started streaming
    started_at: Instant,
}

impl SessionStats {
    /// Create a zeroed stats tracker
    pub fn new() -> Self {
        Self {
            frames_sent: 0,
            bytes_sent: 0,
            started_at: Instant::now(),
        }
    }

    /// Record one completed frame write
    pub fn record_frame(&mut self, message_len: usize) {
        self.frames_sent += 1;
        self.bytes_sent += message_len as u64;
    }

    /// Time since the session started streaming
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Outgoing throughput estimate (bits per second)
    pub fn throughput_bps(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
