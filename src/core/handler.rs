// src/core/handler.rs

//! Request dispatch: the verb set, the pluggable `RequestHandler` seam and
//! the default implementation backing it.
//!
//! The server core does not care what handlers do with a request; it only
//! guarantees that every handler receives the request together with the
//! serving context of the connection it arrived on, so connection-derived
//! metadata (the fingerprint above all) is one method call away.

use crate::connection::ServingContext;
use crate::core::HelloprintError;
use crate::core::protocol::{Reply, Request};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// The verbs understood by [`DefaultHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Verb {
    Ping,
    Fingerprint,
    Peer,
    Quit,
}

/// Handles one decoded request and produces the reply to send back.
///
/// Errors returned here are reported to the client as `-text` replies; they
/// do not terminate the connection.
#[async_trait]
pub trait RequestHandler: fmt::Debug + Send + Sync {
    async fn handle(
        &self,
        request: &Request,
        ctx: &ServingContext,
    ) -> Result<Reply, HelloprintError>;
}

/// The built-in handler implementing the [`Verb`] set.
#[derive(Debug, Default)]
pub struct DefaultHandler;

#[async_trait]
impl RequestHandler for DefaultHandler {
    async fn handle(
        &self,
        request: &Request,
        ctx: &ServingContext,
    ) -> Result<Reply, HelloprintError> {
        let verb = Verb::from_str(request.verb())
            .map_err(|_| HelloprintError::UnknownCommand(request.verb().to_string()))?;
        let args = request.args();

        match verb {
            Verb::Ping => match args {
                [] => Ok(Reply::Simple("PONG".to_string())),
                [msg] => Ok(Reply::Simple(msg.clone())),
                _ => Err(wrong_arity(verb)),
            },
            Verb::Fingerprint => {
                if !args.is_empty() {
                    return Err(wrong_arity(verb));
                }
                // Absent is a normal outcome, not an error: the lookup ran
                // outside a secured connection or before the handshake
                // callback wrote the slot.
                match ctx.fingerprint() {
                    Some(fp) => Ok(Reply::Simple(fp.to_string())),
                    None => Ok(Reply::Null),
                }
            }
            Verb::Peer => {
                if !args.is_empty() {
                    return Err(wrong_arity(verb));
                }
                Ok(Reply::Simple(ctx.peer_addr.to_string()))
            }
            Verb::Quit => {
                if !args.is_empty() {
                    return Err(wrong_arity(verb));
                }
                Ok(Reply::ok())
            }
        }
    }
}

fn wrong_arity(verb: Verb) -> HelloprintError {
    HelloprintError::WrongArgumentCount(verb.to_string().to_ascii_lowercase())
}
