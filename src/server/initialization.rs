// src/server/initialization.rs

//! Handles the complete server initialization process, from certificate
//! loading to listener binding and shared-state construction.
//!
//! Credential material is loaded before the listener is bound, so a fatal
//! startup error never leaves a socket open behind it.

use super::ServerParts;
use super::context::ServerContext;
use super::listener::FingerprintListener;
use super::resolver::ActiveCert;
use crate::config::Config;
use crate::core::state::{ServerState, StatsState};
use anyhow::{Result, anyhow};
use rustls::crypto::aws_lc_rs::sign::any_supported_type;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::CertifiedKey;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tracing::info;

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config, parts: ServerParts) -> Result<ServerContext> {
    config.validate()?;

    let certified = load_certified_key(&config.tls.cert_path, &config.tls.key_path)?;
    let active_cert = Arc::new(ActiveCert::new());
    active_cert.store(certified);
    info!("Loaded certificate from '{}'.", config.tls.cert_path);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        "helloprint server listening on {}:{}",
        config.host, config.port
    );
    let connection_permits = Arc::new(Semaphore::new(config.max_clients));
    let (shutdown_tx, _) = broadcast::channel(1);

    let state = Arc::new(ServerState {
        config,
        stats: StatsState::new(),
        handler: parts.request_handler,
        fingerprinter: parts.fingerprinter,
        active_cert,
        chained_resolver: parts.cert_resolver,
    });

    Ok(ServerContext {
        state,
        listener: FingerprintListener::new(listener),
        shutdown_tx,
        connection_permits,
    })
}

/// Loads the certificate chain and private key and pairs them into the
/// `CertifiedKey` presented during handshakes.
fn load_certified_key(cert_path: &str, key_path: &str) -> Result<Arc<CertifiedKey>> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;
    let signing_key = any_supported_type(&key).map_err(|e| {
        anyhow!(
            "Private key in '{}' is not usable for signing: {}",
            key_path,
            e
        )
    })?;
    Ok(Arc::new(CertifiedKey::new(certs, signing_key)))
}

/// Loads TLS certificates from a PEM file.
fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let cert_file = File::open(path)
        .map_err(|e| anyhow!("Failed to open certificate file '{}': {}", path, e))?;
    let mut cert_reader = BufReader::new(cert_file);
    let certs = rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(anyhow!("No certificates found in '{}'", path));
    }
    Ok(certs)
}

/// Loads a private key from a PEM file.
fn load_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let key_file = File::open(path)
        .map_err(|e| anyhow!("Failed to open private key file '{}': {}", path, e))?;
    let mut key_reader = BufReader::new(key_file);
    rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| anyhow!("No private key found in key file '{}'", path))
}
