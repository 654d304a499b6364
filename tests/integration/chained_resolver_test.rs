// tests/integration/chained_resolver_test.rs

//! A caller-supplied certificate resolver must keep choosing the credential
//! while fingerprinting still happens: chaining, not replacement.

use super::test_helpers::{AcceptAnyCert, TestServer, request, tls_connect_with};
use helloprint::core::fingerprint::PLACEHOLDER_FINGERPRINT;
use helloprint::server::ServerParts;
use rustls::crypto::aws_lc_rs::sign::any_supported_type;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use std::sync::Arc;

/// A resolver that always presents one fixed certificate, standing in for a
/// caller's own selection policy.
#[derive(Debug)]
struct StaticResolver {
    key: Arc<CertifiedKey>,
}

impl ResolvesServerCert for StaticResolver {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(self.key.clone())
    }
}

/// Generates a second, distinct self-signed certificate and pairs it into a
/// `CertifiedKey`, returning the DER bytes alongside for comparison.
fn alternate_certified_key() -> (Arc<CertifiedKey>, Vec<u8>) {
    let certified = rcgen::generate_simple_self_signed(vec!["chained.example".to_string()])
        .expect("Failed to generate alternate certificate");
    let cert_der = certified.cert.der().clone();
    let der_bytes = cert_der.as_ref().to_vec();
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        certified.key_pair.serialize_der(),
    ));
    let signing_key = any_supported_type(&key_der).expect("Alternate key not usable");
    (
        Arc::new(CertifiedKey::new(vec![cert_der], signing_key)),
        der_bytes,
    )
}

#[tokio::test]
async fn test_chained_resolver_picks_credential_and_fingerprint_is_still_recorded() {
    let (key, expected_der) = alternate_certified_key();
    let parts = ServerParts::new().with_cert_resolver(Arc::new(StaticResolver { key }));
    let server = TestServer::start_with_parts(parts).await;

    let verifier = Arc::new(AcceptAnyCert::default());
    let mut stream = tls_connect_with(server.addr, "chained.example", verifier.clone()).await;

    // The client was shown the chained resolver's certificate, not the one
    // loaded from disk at startup.
    let seen = verifier
        .seen_cert
        .lock()
        .unwrap()
        .clone()
        .expect("Verifier saw no certificate");
    assert_eq!(seen, expected_der);

    // The fingerprint hook ran anyway.
    let reply = request(&mut stream, "FINGERPRINT").await;
    assert_eq!(reply, format!("+{PLACEHOLDER_FINGERPRINT}"));

    server.shutdown().await.unwrap();
}
