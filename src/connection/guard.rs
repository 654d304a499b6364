// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tracing::debug;

/// An RAII guard to ensure connection resources are always released when a
/// connection task's scope is exited, whether it ends after serving requests
/// or in the middle of a failed handshake.
pub struct ConnectionGuard {
    /// A shared reference to the server state.
    state: Arc<ServerState>,
    /// The unique identifier for the client session.
    session_id: u64,
    /// The network address of the client.
    addr: SocketAddr,
    /// The `max_clients` permit held for the lifetime of the connection.
    _permit: OwnedSemaphorePermit,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard` and marks the session as connected.
    pub(crate) fn new(
        state: Arc<ServerState>,
        session_id: u64,
        addr: SocketAddr,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        state.stats.increment_current_clients();
        Self {
            state,
            session_id,
            addr,
            _permit: permit,
        }
    }
}

impl Drop for ConnectionGuard {
    /// Releases the client gauge and, via the held permit, the accept slot.
    fn drop(&mut self) {
        self.state.stats.decrement_current_clients();
        debug!(
            "ConnectionGuard dropping, cleaning up resources for connection {} (session {})",
            self.addr, self.session_id
        );
    }
}
