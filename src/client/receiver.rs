//! Frame stream receiver
//!
//! Connects to a feed server and pulls frames off the socket. The protocol
//! is unidirectional: after the connect this side only reads. Any protocol
//! violation (absurd length, zero length, close mid-payload) is terminal
//! for the connection; callers reconnect if they want the feed back.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::protocol::framing::{self, DEFAULT_MAX_FRAME_LEN};

/// Ceiling for the reconnect back-off delay
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Reader side of a frame feed connection
pub struct FeedReceiver {
    socket: TcpStream,
    max_frame_len: usize,
}

impl FeedReceiver {
    /// Connect to a feed server
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true)?;

        Ok(Self {
            socket,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        })
    }

    /// Connect, retrying with exponential back-off.
    ///
    /// Makes up to `attempts` tries, starting from `initial_delay` between
    /// them and doubling up to a ceiling. Returns the last connect error
    /// if every attempt fails.
    pub async fn connect_with_backoff(
        addr: SocketAddr,
        attempts: u32,
        initial_delay: Duration,
    ) -> Result<Self> {
        let mut delay = initial_delay;
        let mut last_error: Option<Error> = None;

        for attempt in 1..=attempts {
            match Self::connect(addr).await {
                Ok(receiver) => return Ok(receiver),
                Err(e) => {
                    tracing::debug!(
                        attempt = attempt,
                        error = %e,
                        "Connect failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                        delay = (delay * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no connection attempts made",
            ))
        }))
    }

    /// Override the largest frame this receiver will accept
    pub fn max_frame_len(mut self, limit: usize) -> Self {
        self.max_frame_len = limit;
        self
    }

    /// Read the next frame off the socket
    pub async fn next_frame(&mut self) -> Result<Bytes> {
        framing::read_frame(&mut self.socket, self.max_frame_len).await
    }
}
