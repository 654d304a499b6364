// src/server/resolver.rs

//! Certificate selection with a fingerprinting side effect.
//!
//! `FingerprintCertResolver` is the credential-selection callback installed
//! into rustls. It is built once per accepted connection, carrying that
//! connection's slot handle, so the value it computes lands on the right
//! connection without any global registry. Independent handshakes never
//! contend with each other.

use crate::core::fingerprint::{Fingerprinter, HandshakeParams, SlotHandle};
use parking_lot::RwLock;
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The currently active certificate. Shared, read-mostly, and swapped as a
/// whole unit so readers never observe a partial update.
#[derive(Default)]
pub struct ActiveCert {
    current: RwLock<Option<Arc<CertifiedKey>>>,
}

impl ActiveCert {
    /// Creates an empty holder with no certificate loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `key` as the active certificate, replacing any previous one.
    pub fn store(&self, key: Arc<CertifiedKey>) {
        *self.current.write() = Some(key);
    }

    /// Returns the active certificate, if one has been loaded.
    pub fn load(&self) -> Option<Arc<CertifiedKey>> {
        self.current.read().clone()
    }
}

impl fmt::Debug for ActiveCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveCert")
            .field("loaded", &self.current.read().is_some())
            .finish()
    }
}

/// The handshake-time hook. On every handshake attempt it computes the
/// fingerprint for its connection, records it in the connection's identity
/// slot (first writer wins, renegotiation attempts are no-ops), then picks
/// the credential to present.
#[derive(Debug)]
pub struct FingerprintCertResolver {
    slot: SlotHandle,
    fingerprinter: Arc<dyn Fingerprinter>,
    active: Arc<ActiveCert>,
    chained: Option<Arc<dyn ResolvesServerCert>>,
}

impl FingerprintCertResolver {
    /// Creates the resolver for one connection. `chained` is a caller
    /// supplied resolver that takes over credential selection; fingerprint
    /// recording happens regardless.
    pub fn new(
        slot: SlotHandle,
        fingerprinter: Arc<dyn Fingerprinter>,
        active: Arc<ActiveCert>,
        chained: Option<Arc<dyn ResolvesServerCert>>,
    ) -> Self {
        Self {
            slot,
            fingerprinter,
            active,
            chained,
        }
    }
}

impl ResolvesServerCert for FingerprintCertResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        let params = summarize(&client_hello);
        debug!(
            server_name = ?params.server_name,
            cipher_suites = params.cipher_suites.len(),
            signature_schemes = params.signature_schemes.len(),
            "resolving certificate for client hello"
        );

        let fingerprint = self.fingerprinter.fingerprint(&params);
        self.slot.get_or_create().try_set(fingerprint);

        // Returning `None` here fails the handshake, which is the required
        // outcome when no credential is available.
        match &self.chained {
            Some(resolver) => resolver.resolve(client_hello),
            None => self.active.load(),
        }
    }
}

/// Flattens the borrowed client hello into plain owned data for the
/// fingerprint function.
fn summarize(client_hello: &ClientHello<'_>) -> HandshakeParams {
    HandshakeParams {
        server_name: client_hello.server_name().map(str::to_string),
        cipher_suites: client_hello
            .cipher_suites()
            .iter()
            .map(|suite| u16::from(*suite))
            .collect(),
        signature_schemes: client_hello
            .signature_schemes()
            .iter()
            .map(|scheme| u16::from(*scheme))
            .collect(),
        alpn: client_hello
            .alpn()
            .map(|protocols| protocols.map(<[u8]>::to_vec).collect())
            .unwrap_or_default(),
    }
}
