// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum HelloprintError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("ERR protocol error: {0}")]
    Protocol(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for HelloprintError {
    fn clone(&self) -> Self {
        match self {
            HelloprintError::Io(e) => HelloprintError::Io(Arc::clone(e)),
            HelloprintError::Protocol(s) => HelloprintError::Protocol(s.clone()),
            HelloprintError::UnknownCommand(s) => HelloprintError::UnknownCommand(s.clone()),
            HelloprintError::WrongArgumentCount(s) => {
                HelloprintError::WrongArgumentCount(s.clone())
            }
        }
    }
}

impl PartialEq for HelloprintError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HelloprintError::Io(e1), HelloprintError::Io(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (HelloprintError::Protocol(s1), HelloprintError::Protocol(s2)) => s1 == s2,
            (HelloprintError::UnknownCommand(s1), HelloprintError::UnknownCommand(s2)) => s1 == s2,
            (HelloprintError::WrongArgumentCount(s1), HelloprintError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for HelloprintError {
    fn from(e: std::io::Error) -> Self {
        HelloprintError::Io(Arc::new(e))
    }
}

impl From<std::string::FromUtf8Error> for HelloprintError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        HelloprintError::Protocol("request is not valid UTF-8".to_string())
    }
}
