//! Feed server listener
//!
//! Handles the TCP accept loop, applies the address filter, and spawns one
//! broadcast session per accepted connection. Sessions are owned tasks in a
//! [`JoinSet`], not detached workers: at shutdown they are aborted and the
//! registry is drained, which stops the producer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::producer::FrameProducer;
use crate::registry::SessionRegistry;
use crate::server::config::ServerConfig;
use crate::server::filter::AddressFilter;
use crate::session::BroadcastSession;
use crate::source::FrameSourceFactory;

/// Frame broadcast server
pub struct FeedServer<F: FrameSourceFactory> {
    config: ServerConfig,
    filter: AddressFilter,
    registry: Arc<SessionRegistry<F>>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
    sessions: Mutex<JoinSet<()>>,
}

impl<F: FrameSourceFactory> FeedServer<F> {
    /// Create a new server over the given source factory.
    ///
    /// Fails only on invalid configuration.
    pub fn new(config: ServerConfig, factory: F) -> Result<Self> {
        config.validate()?;

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let producer = Arc::new(FrameProducer::new(factory));
        let registry = Arc::new(SessionRegistry::new(producer, config.source.clone()));
        let filter = AddressFilter::new(config.allow_list.clone());

        Ok(Self {
            config,
            filter,
            registry,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
            sessions: Mutex::new(JoinSet::new()),
        })
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry<F>> {
        &self.registry
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Bind the listening socket.
    ///
    /// Failure here is the one process-fatal condition. Exposed separately
    /// so callers binding to an ephemeral port can learn the actual
    /// address before serving.
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "Feed server listening");
        Ok(listener)
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<Fut>(&self, shutdown: Fut) -> Result<()>
    where
        Fut: std::future::Future<Output = ()>,
    {
        let listener = self.bind().await?;
        self.serve_until(listener, shutdown).await
    }

    /// Serve on a pre-bound listener until the shutdown future resolves
    pub async fn serve_until<Fut>(&self, listener: TcpListener, shutdown: Fut) -> Result<()>
    where
        Fut: std::future::Future<Output = ()>,
    {
        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        self.shutdown().await;
        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Address filter runs before any session state exists. Dropping the
        // socket closes it; the peer is never registered and never sent a
        // byte.
        if !self.filter.allows(&peer_addr) {
            tracing::warn!(peer = %peer_addr, "Connection rejected by allow-list");
            return;
        }

        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let session = BroadcastSession::new(
            session_id,
            socket,
            peer_addr,
            Arc::clone(&self.registry),
            self.config.io_timeout,
            self.config.pacing_floor,
        );

        let mut sessions = self.sessions.lock().await;
        // Reap finished sessions so the set does not grow unbounded.
        while sessions.try_join_next().is_some() {}
        sessions.spawn(async move {
            let _permit = permit;
            session.run().await;
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        sessions.abort_all();
        while sessions.join_next().await.is_some() {}
        drop(sessions);

        self.registry.drain().await;
        tracing::info!("Feed server stopped");
    }
}
