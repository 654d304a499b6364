// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::session::ServingContext;
use crate::core::handler::Verb;
use crate::core::protocol::{QueryCodec, Reply, Request};
use crate::core::state::ServerState;
use crate::core::HelloprintError;
use crate::server::Connection;
use futures::{SinkExt, StreamExt};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_rustls::server::TlsStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// Manages the full lifecycle of one client connection after its TLS session
/// has been established and its serving context bound.
pub struct ConnectionHandler {
    framed: Framed<TlsStream<Connection>, QueryCodec>,
    ctx: ServingContext,
    state: Arc<ServerState>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`.
    pub fn new(
        stream: TlsStream<Connection>,
        ctx: ServingContext,
        state: Arc<ServerState>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            framed: Framed::new(stream, QueryCodec),
            ctx,
            state,
            shutdown_rx,
        }
    }

    /// The main event loop for the connection, handling incoming requests and signals.
    pub async fn run(&mut self) -> Result<(), HelloprintError> {
        loop {
            tokio::select! {
                // Prioritize shutdown signals over pending requests.
                biased;
                _ = self.shutdown_rx.recv() => {
                    debug!(
                        "Connection handler for {} received shutdown signal.",
                        self.ctx.peer_addr
                    );
                    let shutdown_msg =
                        Reply::Error("SHUTDOWN Server is shutting down".to_string());
                    let _ = self.framed.send(shutdown_msg).await;
                    break;
                }
                result = self.framed.next() => {
                    match result {
                        Some(Ok(request)) => {
                            debug!(
                                "Session {}: received request: {:?}",
                                self.ctx.session_id, request
                            );
                            self.state.stats.increment_total_requests();
                            let closing = is_quit(&request);
                            match self.state.handler.handle(&request, &self.ctx).await {
                                Ok(reply) => self.framed.send(reply).await?,
                                Err(e) => self.send_error_to_client(e).await?,
                            }
                            if closing {
                                debug!(
                                    "Session {}: client sent QUIT, closing.",
                                    self.ctx.session_id
                                );
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            if is_normal_disconnect(&e) {
                                debug!(
                                    "Connection from {} closed by peer: {}",
                                    self.ctx.peer_addr, e
                                );
                            } else {
                                warn!("Connection error for {}: {}", self.ctx.peer_addr, e);
                            }
                            break;
                        }
                        None => {
                            debug!("Connection from {} closed by peer.", self.ctx.peer_addr);
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Sends an error reply back to the client.
    async fn send_error_to_client(&mut self, e: HelloprintError) -> Result<(), HelloprintError> {
        let reply = Reply::Error(e.to_string());
        debug!(
            "Session {}: sending error reply: {:?}",
            self.ctx.session_id, reply
        );
        self.framed.send(reply).await
    }
}

/// QUIT terminates the session whatever handler is installed; the reply the
/// handler produced is still sent first.
fn is_quit(request: &Request) -> bool {
    matches!(Verb::from_str(request.verb()), Ok(Verb::Quit))
}

/// Helper function to check for non-critical disconnection errors.
fn is_normal_disconnect(e: &HelloprintError) -> bool {
    matches!(e, HelloprintError::Io(arc_err) if matches!(
        arc_err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionAborted
    ))
}
