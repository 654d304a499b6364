// src/core/mod.rs

//! The central module containing the core logic and data structures of helloprint.

pub mod errors;
pub mod fingerprint;
pub mod handler;
pub mod protocol;
pub mod state;

pub use errors::HelloprintError;
