// src/server/listener.rs

//! The accepting listener adapter and the connection wrapper it hands out.
//!
//! Every stream accepted here is wrapped in a [`Connection`] before the TLS
//! layer sees it. The wrapper carries the holder for the connection's
//! identity slot and travels through the whole stack unchanged: the secured
//! stream is `TlsStream<Connection>`, so the handshake callback and the
//! context binder reach the same slot by reference, with no runtime type
//! recovery anywhere.

use crate::core::fingerprint::SlotHandle;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};

/// An accepted, not-yet-secured stream tagged with the holder of its
/// identity slot.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    slot: SlotHandle,
}

impl Connection {
    /// Wraps a raw stream with an empty slot holder.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            slot: SlotHandle::new(),
        }
    }

    /// The holder of this connection's identity slot.
    pub fn slot(&self) -> &SlotHandle {
        &self.slot
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, std::io::Error>> {
        Pin::new(&mut self.get_mut().stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), std::io::Error>> {
        Pin::new(&mut self.get_mut().stream).poll_flush(cx)
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), std::io::Error>> {
        Pin::new(&mut self.get_mut().stream).poll_shutdown(cx)
    }
}

/// Wraps a bound `TcpListener` so that every accepted stream comes out
/// pre-equipped with an empty slot holder. Accept errors pass through
/// unchanged; transient-failure policy belongs to the caller. Dropping the
/// adapter closes the underlying listener.
#[derive(Debug)]
pub struct FingerprintListener {
    inner: TcpListener,
}

impl FingerprintListener {
    /// Wraps an already-bound listener.
    pub fn new(inner: TcpListener) -> Self {
        Self { inner }
    }

    /// Accepts the next connection, tagged and ready for the TLS layer.
    pub async fn accept(&self) -> std::io::Result<(Connection, SocketAddr)> {
        let (stream, addr) = self.inner.accept().await?;
        Ok((Connection::new(stream), addr))
    }

    /// The local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}
