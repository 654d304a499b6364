// src/server/mod.rs

//! The secure server façade: configuration of the pluggable parts, startup,
//! and the accept/serve loop.

use crate::config::Config;
use crate::core::fingerprint::{Fingerprinter, PlaceholderFingerprinter};
use crate::core::handler::{DefaultHandler, RequestHandler};
use anyhow::Result;
use rustls::server::ResolvesServerCert;
use std::sync::Arc;

mod connection_loop;
mod context;
mod initialization;
mod listener;
mod resolver;

pub use context::ServerContext;
pub use listener::{Connection, FingerprintListener};
pub use resolver::{ActiveCert, FingerprintCertResolver};

/// The pluggable collaborators a server is assembled from. `Default` wires
/// in the built-in verb handler and the placeholder fingerprinter.
#[derive(Debug, Clone)]
pub struct ServerParts {
    pub(crate) request_handler: Arc<dyn RequestHandler>,
    pub(crate) fingerprinter: Arc<dyn Fingerprinter>,
    pub(crate) cert_resolver: Option<Arc<dyn ResolvesServerCert>>,
}

impl Default for ServerParts {
    fn default() -> Self {
        Self {
            request_handler: Arc::new(DefaultHandler),
            fingerprinter: Arc::new(PlaceholderFingerprinter),
            cert_resolver: None,
        }
    }
}

impl ServerParts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the request handler dispatched on every connection.
    pub fn with_request_handler(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.request_handler = handler;
        self
    }

    /// Replaces the fingerprint function run on every handshake attempt.
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Installs a caller-supplied certificate resolver. It is chained behind
    /// the fingerprint hook, never replaced by it: the hook records the
    /// fingerprint first, then delegates credential selection here.
    pub fn with_cert_resolver(mut self, resolver: Arc<dyn ResolvesServerCert>) -> Self {
        self.cert_resolver = Some(resolver);
        self
    }
}

/// Loads credential material, binds the listener, and assembles the shared
/// state. Fails without leaving a socket open if the certificate or key is
/// unreadable or invalid.
pub async fn bind(config: Config, parts: ServerParts) -> Result<ServerContext> {
    initialization::setup(config, parts).await
}

/// Runs the accept/serve loop on an already-bound context. Returns `Ok(())`
/// on a requested shutdown (signal or `shutdown_tx`); that is the expected
/// termination, not a failure.
pub async fn serve(ctx: ServerContext) -> Result<()> {
    connection_loop::run(ctx).await
}

/// The main server startup function: bind, then serve until shutdown.
pub async fn run(config: Config, parts: ServerParts) -> Result<()> {
    let server_context = bind(config, parts).await?;
    serve(server_context).await
}
