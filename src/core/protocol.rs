// src/core/protocol.rs

//! Implements the line-oriented query protocol and the corresponding
//! `Encoder` and `Decoder` for network communication.
//!
//! Requests are single CRLF-terminated lines of whitespace-separated words.
//! Replies use a small RESP-flavored surface: `+text` for success, `-text`
//! for errors and `$-1` for an absent value.

use crate::core::HelloprintError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence terminating every line.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

/// Protocol-level limit to prevent denial-of-service via unbounded lines.
pub const MAX_REQUEST_LINE_BYTES: usize = 8 * 1024;

/// One decoded request line. `parts` is never empty; blank lines are skipped
/// by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub parts: Vec<String>,
}

impl Request {
    /// The first word of the line, conventionally the verb.
    pub fn verb(&self) -> &str {
        &self.parts[0]
    }

    /// Everything after the verb.
    pub fn args(&self) -> &[String] {
        &self.parts[1..]
    }
}

/// A single reply frame sent back to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `+text\r\n`
    Simple(String),
    /// `-text\r\n`
    Error(String),
    /// `$-1\r\n`, the absent-value marker.
    Null,
}

impl Reply {
    /// The canonical success reply.
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }
}

/// A `tokio_util::codec` implementation for the query protocol.
#[derive(Debug)]
pub struct QueryCodec;

impl Encoder<Reply> for QueryCodec {
    type Error = HelloprintError;

    fn encode(&mut self, item: Reply, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Reply::Simple(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Reply::Error(s) => {
                dst.extend_from_slice(b"-");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Reply::Null => {
                dst.extend_from_slice(b"$-1\r\n");
            }
        }
        Ok(())
    }
}

impl Decoder for QueryCodec {
    type Item = Request;
    type Error = HelloprintError;

    /// Decodes one request line from the buffer. Returns `Ok(None)` when the
    /// line is still incomplete. Blank lines are consumed and skipped so a
    /// pipelined buffer never stalls behind them.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = find_crlf(src) else {
                if src.len() > MAX_REQUEST_LINE_BYTES {
                    return Err(HelloprintError::Protocol(format!(
                        "request line exceeds {MAX_REQUEST_LINE_BYTES} bytes"
                    )));
                }
                return Ok(None);
            };

            if pos > MAX_REQUEST_LINE_BYTES {
                return Err(HelloprintError::Protocol(format!(
                    "request line exceeds {MAX_REQUEST_LINE_BYTES} bytes"
                )));
            }

            let mut line = src.split_to(pos + CRLF_LEN);
            line.truncate(pos);
            let text = String::from_utf8(line.to_vec())?;

            let parts: Vec<String> = text
                .split_ascii_whitespace()
                .map(str::to_string)
                .collect();
            if parts.is_empty() {
                continue;
            }
            return Ok(Some(Request { parts }));
        }
    }
}

fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF_LEN).position(|window| window == CRLF)
}
