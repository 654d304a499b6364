// src/core/state.rs

//! Defines the central `ServerState` struct and server-wide statistics.

use crate::config::Config;
use crate::core::fingerprint::Fingerprinter;
use crate::core::handler::RequestHandler;
use crate::server::ActiveCert;
use rustls::server::ResolvesServerCert;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The central struct holding all shared, server-wide state.
/// This struct is wrapped in an `Arc` and passed to every connection task,
/// providing a single source of truth for configuration and the pluggable
/// collaborators.
#[derive(Debug)]
pub struct ServerState {
    /// The validated server configuration. Immutable after startup.
    pub config: Config,
    /// Server-wide counters and gauges.
    pub stats: StatsState,
    /// Handles decoded requests on every connection.
    pub handler: Arc<dyn RequestHandler>,
    /// Computes a fingerprint from each handshake attempt's parameters.
    pub fingerprinter: Arc<dyn Fingerprinter>,
    /// The currently active certificate, swapped as a whole unit.
    pub active_cert: Arc<ActiveCert>,
    /// A caller-supplied certificate resolver to consult for credential
    /// selection. Fingerprinting runs either way; only the choice of
    /// certificate is delegated.
    pub chained_resolver: Option<Arc<dyn ResolvesServerCert>>,
}

/// Holds all state and logic related to server-wide statistics and monitoring.
#[derive(Debug, Default)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The total number of requests processed by the server since startup.
    total_requests: AtomicU64,
    /// The number of TLS handshakes that failed or timed out.
    handshake_failures: AtomicU64,
    /// The number of connections dropped because `max_clients` was reached.
    rejected_connections: AtomicU64,
    /// The number of currently connected clients.
    current_clients: AtomicU64,
}

impl StatsState {
    /// Creates a new `StatsState` with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically increments the total number of connections received.
    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of connections received.
    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Atomically increments the total number of requests processed.
    pub fn increment_total_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the total number of requests processed.
    pub fn get_total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Atomically increments the number of failed TLS handshakes.
    pub fn increment_handshake_failures(&self) {
        self.handshake_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the number of failed TLS handshakes.
    pub fn get_handshake_failures(&self) -> u64 {
        self.handshake_failures.load(Ordering::Relaxed)
    }

    /// Atomically increments the number of over-limit rejections.
    pub fn increment_rejected_connections(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the number of over-limit rejections.
    pub fn get_rejected_connections(&self) -> u64 {
        self.rejected_connections.load(Ordering::Relaxed)
    }

    /// Adjusts the connected-client gauge as sessions begin and end.
    pub fn increment_current_clients(&self) {
        self.current_clients.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements the connected-client gauge.
    pub fn decrement_current_clients(&self) {
        self.current_clients.fetch_sub(1, Ordering::Relaxed);
    }

    /// Gets the number of currently connected clients.
    pub fn get_current_clients(&self) -> u64 {
        self.current_clients.load(Ordering::Relaxed)
    }
}
