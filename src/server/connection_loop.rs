// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use super::listener::Connection;
use super::resolver::FingerprintCertResolver;
use crate::connection::{ConnectionGuard, ConnectionHandler, ServingContext};
use crate::core::state::ServerState;
use anyhow::{Result, anyhow};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_rustls::{TlsAcceptor, rustls};
use tracing::{debug, error, info, warn};

/// The main server loop that accepts connections and handles graceful shutdown.
pub async fn run(ctx: ServerContext) -> Result<()> {
    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();

    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let mut shutdown_rx = ctx.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown requested, closing listener.");
                break;
            }

            res = ctx.listener.accept() => {
                match res {
                    Ok((conn, addr)) => {
                        ctx.state.stats.increment_total_connections();

                        let Ok(permit) = ctx.connection_permits.clone().try_acquire_owned() else {
                            ctx.state.stats.increment_rejected_connections();
                            warn!(
                                "Connection from {} dropped: max_clients ({}) reached.",
                                addr, ctx.state.config.max_clients
                            );
                            continue;
                        };

                        session_id_counter = session_id_counter.wrapping_add(1);
                        let session_id = session_id_counter;
                        info!("Accepted new connection from: {}", addr);

                        let state = ctx.state.clone();
                        let conn_shutdown_rx = ctx.shutdown_tx.subscribe();

                        client_tasks.spawn(async move {
                            let _guard =
                                ConnectionGuard::new(state.clone(), session_id, addr, permit);
                            serve_connection(conn, addr, session_id, state, conn_shutdown_rx)
                                .await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res {
                    if e.is_panic() {
                        error!("A client handler panicked: {e:?}");
                    }
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        error!("Failed to send shutdown signal. Some tasks may not terminate gracefully.");
    }

    client_tasks.shutdown().await;
    info!(
        "All client connections closed. Served {} connections and {} requests.",
        ctx.state.stats.get_total_connections(),
        ctx.state.stats.get_total_requests()
    );
    Ok(())
}

/// Drives one connection end-to-end: the TLS handshake under the configured
/// timeout, context binding, then the request loop. Handshake failures are
/// contained to this connection; the accept loop never sees them.
async fn serve_connection(
    conn: Connection,
    addr: SocketAddr,
    session_id: u64,
    state: Arc<ServerState>,
    shutdown_rx: broadcast::Receiver<()>,
) {
    // The resolver shares the slot handle with the connection it was built
    // for, which is what ties the handshake callback's write to the serving
    // context's later read.
    let resolver = FingerprintCertResolver::new(
        conn.slot().clone(),
        state.fingerprinter.clone(),
        state.active_cert.clone(),
        state.chained_resolver.clone(),
    );
    let tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(resolver));
    let acceptor = TlsAcceptor::from(Arc::new(tls_config));

    let handshake_timeout = state.config.tls.handshake_timeout;
    match tokio::time::timeout(handshake_timeout, acceptor.accept(conn)).await {
        Ok(Ok(tls_stream)) => {
            info!("TLS handshake successful for {addr}");
            let ctx = ServingContext::for_connection(session_id, addr, &tls_stream);
            if let Some(name) = ctx.server_name.as_deref() {
                debug!("Session {session_id}: client requested server name '{name}'.");
            }
            let mut handler = ConnectionHandler::new(tls_stream, ctx, state, shutdown_rx);
            if let Err(e) = handler.run().await {
                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
            }
        }
        Ok(Err(e)) => {
            state.stats.increment_handshake_failures();
            warn!("TLS handshake error for {addr}: {e}");
        }
        Err(_) => {
            state.stats.increment_handshake_failures();
            warn!("TLS handshake timed out for {addr} after {handshake_timeout:?}.");
        }
    }
}
