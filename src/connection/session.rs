// src/connection/session.rs

//! Defines `ServingContext`, the per-connection lookup environment handed to
//! request handlers.
//!
//! The context is bound once, right after the TLS session is established and
//! before any request is dispatched. It holds a reference to the connection's
//! identity slot rather than a copy of its contents, so a fingerprint written
//! by the handshake callback stays visible through the context even if the
//! binding happened first.

use crate::core::fingerprint::IdentitySlot;
use crate::server::Connection;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_rustls::server::TlsStream;

/// The request-scoped lookup environment for one connection.
///
/// Created once per connection, read-only afterwards, shared by every request
/// served on that connection.
#[derive(Debug, Clone)]
pub struct ServingContext {
    /// The unique identifier of this session.
    pub session_id: u64,
    /// The network address of the peer.
    pub peer_addr: SocketAddr,
    /// The server name (SNI) the client negotiated, if any.
    pub server_name: Option<String>,
    /// The connection's identity slot, if this context was bound to one.
    slot: Option<Arc<IdentitySlot>>,
}

impl ServingContext {
    /// Binds a context to a freshly secured connection.
    ///
    /// Reaches through the TLS stream to the underlying [`Connection`],
    /// materializes its identity slot if the handshake callback has not done
    /// so already, and captures a shared reference to it along with the
    /// negotiated server name.
    pub fn for_connection(
        session_id: u64,
        peer_addr: SocketAddr,
        stream: &TlsStream<Connection>,
    ) -> Self {
        let (conn, session) = stream.get_ref();
        let slot = conn.slot().get_or_create();
        let server_name = session.server_name().map(str::to_string);
        Self {
            session_id,
            peer_addr,
            server_name,
            slot: Some(slot),
        }
    }

    /// Creates a context with no slot binding. Lookups through it report the
    /// fingerprint as absent.
    pub fn unbound(session_id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            session_id,
            peer_addr,
            server_name: None,
            slot: None,
        }
    }

    /// Replaces the slot binding. Useful for embedders that drive their own
    /// serving loop.
    pub fn with_slot(mut self, slot: Arc<IdentitySlot>) -> Self {
        self.slot = Some(slot);
        self
    }

    /// The fingerprint lookup: returns the value computed for this
    /// connection's handshake, or `None` when no slot is bound or the slot
    /// has not been written yet. Pure read, safe to call repeatedly.
    pub fn fingerprint(&self) -> Option<&str> {
        self.slot.as_deref().and_then(IdentitySlot::get)
    }
}
