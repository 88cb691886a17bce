//! Broadcast session loop
//!
//! Protocol-correct, rate-paced delivery of the latest frame to one client.
//! The session moves through three states: it joins the registry (which may
//! start the producer), streams until a write fails or the registry empties,
//! then leaves the registry (which may stop the producer). A failure in one
//! session never touches another: the error propagates no further than this
//! loop.
//!
//! Sessions deliberately tolerate cross-session skew: two sessions may send
//! slightly different "latest" frames on the same tick. Frames are
//! ephemeral, so this is an accepted inconsistency, not a correctness
//! problem.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::protocol::framing;
use crate::registry::SessionRegistry;
use crate::source::FrameSourceFactory;
use crate::stats::SessionStats;

/// Send loop for one connected client
pub struct BroadcastSession<F: FrameSourceFactory> {
    session_id: u64,
    socket: TcpStream,
    peer: String,
    registry: Arc<SessionRegistry<F>>,
    io_timeout: Duration,
    pacing_floor: Duration,
    stats: SessionStats,
}

impl<F: FrameSourceFactory> BroadcastSession<F> {
    /// Create a session for an accepted, filtered connection
    pub fn new(
        session_id: u64,
        socket: TcpStream,
        peer_addr: SocketAddr,
        registry: Arc<SessionRegistry<F>>,
        io_timeout: Duration,
        pacing_floor: Duration,
    ) -> Self {
        Self {
            session_id,
            socket,
            peer: peer_addr.to_string(),
            registry,
            io_timeout,
            pacing_floor,
            stats: SessionStats::new(),
        }
    }

    /// Run the session to completion.
    ///
    /// Joins the registry, streams, and always leaves the registry on the
    /// way out regardless of how streaming ended.
    pub async fn run(mut self) {
        self.registry.join(&self.peer).await;
        tracing::info!(
            session_id = self.session_id,
            peer = %self.peer,
            "Session streaming"
        );

        let result = self.stream().await;

        self.registry.leave(&self.peer).await;
        match result {
            Ok(()) => tracing::info!(
                session_id = self.session_id,
                peer = %self.peer,
                frames = self.stats.frames_sent,
                bytes = self.stats.bytes_sent,
                "Session closed"
            ),
            Err(e) => tracing::info!(
                session_id = self.session_id,
                peer = %self.peer,
                frames = self.stats.frames_sent,
                bytes = self.stats.bytes_sent,
                error = %e,
                "Session closed on error"
            ),
        }
    }

    /// Streaming state: send the latest frame at the target cadence.
    ///
    /// An empty slot means "nothing to send this tick", not an error; the
    /// cycle still sleeps so an idle feed never busy-loops.
    async fn stream(&mut self) -> Result<()> {
        while self.registry.active_count().await > 0 {
            let started = Instant::now();

            let frame = self.registry.producer().snapshot().await;
            if !frame.is_empty() {
                self.send_frame(frame).await?;
            }

            let period = self.registry.producer().frame_interval();
            let delay = period
                .saturating_sub(started.elapsed())
                .max(self.pacing_floor);
            tokio::time::sleep(delay).await;
        }

        Ok(())
    }

    /// Write one length-prefixed message under the connection deadline
    async fn send_frame(&mut self, frame: Bytes) -> Result<()> {
        let message = framing::encode_frame(&frame)?;

        match tokio::time::timeout(self.io_timeout, self.socket.write_all(&message)).await {
            Ok(Ok(())) => {
                self.stats.record_frame(message.len());
                Ok(())
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Err(Error::DeadlineElapsed),
        }
    }
}
