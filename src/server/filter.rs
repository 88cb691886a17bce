//! Peer address filtering
//!
//! Incoming connections are matched against a set of address-prefix
//! strings before any session state exists. A rejected peer is logged and
//! its socket dropped; it never reaches the registry and never receives a
//! byte.

use std::net::SocketAddr;

/// Allow-list of peer address prefixes
///
/// Matching is a plain string-prefix test on the peer IP's text form, so
/// `"10.0.0."` admits the whole /24 and `"10."` the whole /8. An empty
/// list admits everyone.
#[derive(Debug, Clone)]
pub struct AddressFilter {
    prefixes: Vec<String>,
}

impl AddressFilter {
    /// Build a filter from prefix strings
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// Whether a peer address passes the filter
    pub fn allows(&self, peer: &SocketAddr) -> bool {
        if self.prefixes.is_empty() {
            return true;
        }

        let ip = peer.ip().to_string();
        self.prefixes.iter().any(|prefix| ip.starts_with(prefix))
    }
}
