// tests/integration/isolation_test.rs

//! Verifies that fingerprints never leak across connections: N concurrent
//! clients, each producing a distinct deterministic fingerprint, each observe
//! only their own.

use super::test_helpers::{TestServer, request, tls_connect};
use helloprint::core::fingerprint::{Fingerprinter, HandshakeParams};
use helloprint::server::ServerParts;
use std::sync::Arc;

/// A deterministic test fingerprinter: derives the fingerprint from the SNI
/// the client sent, so every connection can be told apart.
#[derive(Debug)]
struct SniFingerprinter;

impl Fingerprinter for SniFingerprinter {
    fn fingerprint(&self, params: &HandshakeParams) -> String {
        format!("sni:{}", params.server_name.as_deref().unwrap_or("none"))
    }
}

#[tokio::test]
async fn test_concurrent_connections_see_only_their_own_fingerprint() {
    let parts = ServerParts::new().with_fingerprinter(Arc::new(SniFingerprinter));
    let server = TestServer::start_with_parts(parts).await;
    let addr = server.addr;

    let mut tasks = Vec::new();
    for i in 0..8 {
        tasks.push(tokio::spawn(async move {
            let name = format!("client{i}.example");
            let mut stream = tls_connect(addr, &name).await;

            // Two requests on the same connection share one context and must
            // agree with each other.
            for _ in 0..2 {
                let reply = request(&mut stream, "FINGERPRINT").await;
                assert_eq!(reply, format!("+sni:{name}"));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sequential_connections_get_fresh_slots() {
    let parts = ServerParts::new().with_fingerprinter(Arc::new(SniFingerprinter));
    let server = TestServer::start_with_parts(parts).await;

    // Reconnecting must never show the previous connection's value.
    for name in ["first.example", "second.example"] {
        let mut stream = tls_connect(server.addr, name).await;
        let reply = request(&mut stream, "FINGERPRINT").await;
        assert_eq!(reply, format!("+sni:{name}"));
    }

    server.shutdown().await.unwrap();
}
