//! Server configuration
//!
//! Values only; how they are loaded (CLI, file) is the embedding
//! application's concern.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::Result;
use crate::source::SourceConfig;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Address prefixes permitted to establish a session. Empty admits
    /// every peer.
    pub allow_list: Vec<String>,

    /// Deadline applied to each socket write
    pub io_timeout: Duration,

    /// Lower bound on a session's pacing sleep, so a slow cycle never
    /// turns into a busy loop
    pub pacing_floor: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Parameters handed to the frame source on each producer start
    pub source: SourceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:6666".parse().unwrap(),
            allow_list: Vec::new(),
            io_timeout: Duration::from_secs(10),
            pacing_floor: Duration::from_millis(5),
            tcp_nodelay: true, // Important for low latency
            max_connections: 0, // Unlimited
            source: SourceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the address allow-list
    pub fn allow_list(mut self, prefixes: Vec<String>) -> Self {
        self.allow_list = prefixes;
        self
    }

    /// Add one allowed address prefix
    pub fn allow(mut self, prefix: impl Into<String>) -> Self {
        self.allow_list.push(prefix.into());
        self
    }

    /// Set the per-write deadline
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Set the pacing sleep floor
    pub fn pacing_floor(mut self, floor: Duration) -> Self {
        self.pacing_floor = floor;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the frame source parameters
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Check all values against their allowed ranges
    pub fn validate(&self) -> Result<()> {
        if self.io_timeout.is_zero() {
            return Err(crate::error::Error::InvalidConfig(
                "io_timeout must be nonzero".into(),
            ));
        }
        if self.pacing_floor.is_zero() {
            return Err(crate::error::Error::InvalidConfig(
                "pacing_floor must be nonzero".into(),
            ));
        }
        self.source.validate()
    }
}
