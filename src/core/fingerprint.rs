// src/core/fingerprint.rs

//! Per-connection fingerprint storage and the pluggable fingerprint function.
//!
//! A fingerprint is computed once, during the TLS handshake, and read later by
//! request handlers on the same connection. The two phases run in different
//! parts of the stack, so the value travels through a shared, single-assignment
//! cell (`IdentitySlot`) owned by the connection. The cell itself is created
//! lazily through `SlotHandle`, whose create-if-absent operation is atomic, so
//! concurrent callers always converge on the same slot.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// The fixed output of [`PlaceholderFingerprinter`]. Real deployments replace
/// the fingerprinter; this value exists so the plumbing can be exercised
/// without any algorithm behind it.
pub const PLACEHOLDER_FINGERPRINT: &str = "definitely a fingerprint";

/// A single-assignment cell holding at most one fingerprint for the lifetime
/// of its connection.
///
/// `try_set` follows first-writer-wins semantics: the first successful write
/// sticks, later writes are silent no-ops. Readers either see the full stored
/// value or nothing. No external locking is required.
#[derive(Debug, Default)]
pub struct IdentitySlot {
    value: OnceCell<String>,
}

impl IdentitySlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            value: OnceCell::new(),
        }
    }

    /// Stores `value` if the slot is still empty. Returns `true` if this call
    /// performed the write, `false` if a value was already present.
    pub fn try_set(&self, value: impl Into<String>) -> bool {
        self.value.set(value.into()).is_ok()
    }

    /// Returns the stored fingerprint, or `None` if nothing has been written.
    pub fn get(&self) -> Option<&str> {
        self.value.get().map(String::as_str)
    }
}

/// The per-connection holder through which an [`IdentitySlot`] is shared.
///
/// Each accepted connection carries exactly one handle. The slot behind it is
/// materialized on first use by whichever side gets there first, the handshake
/// callback or the context binder, through a single atomic create-if-absent
/// step. Clones share the same underlying cell.
#[derive(Debug, Clone, Default)]
pub struct SlotHandle {
    cell: Arc<OnceCell<Arc<IdentitySlot>>>,
}

impl SlotHandle {
    /// Creates a handle with no slot installed yet.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the slot, installing a fresh empty one if none exists.
    /// Concurrent callers receive the same slot.
    pub fn get_or_create(&self) -> Arc<IdentitySlot> {
        self.cell
            .get_or_init(|| Arc::new(IdentitySlot::new()))
            .clone()
    }

    /// Returns the slot if one has been installed.
    pub fn get(&self) -> Option<Arc<IdentitySlot>> {
        self.cell.get().cloned()
    }
}

/// The negotiation parameters visible when a client hello arrives, flattened
/// into plain data so fingerprint functions stay pure and free of TLS-library
/// lifetimes.
#[derive(Debug, Clone, Default)]
pub struct HandshakeParams {
    /// The server name the client asked for (SNI), if any.
    pub server_name: Option<String>,
    /// Cipher suites offered by the client, in wire order, as IANA ids.
    pub cipher_suites: Vec<u16>,
    /// Signature schemes the client supports, as IANA ids.
    pub signature_schemes: Vec<u16>,
    /// ALPN protocols offered by the client, in preference order.
    pub alpn: Vec<Vec<u8>>,
}

/// Computes a textual identifier from one handshake attempt's parameters.
///
/// Implementations must not perform I/O or block; they run inside the TLS
/// handshake callback on the connection's own task.
pub trait Fingerprinter: fmt::Debug + Send + Sync {
    fn fingerprint(&self, params: &HandshakeParams) -> String;
}

/// The default fingerprinter. Ignores the parameters and returns
/// [`PLACEHOLDER_FINGERPRINT`].
#[derive(Debug, Default)]
pub struct PlaceholderFingerprinter;

impl Fingerprinter for PlaceholderFingerprinter {
    fn fingerprint(&self, _params: &HandshakeParams) -> String {
        PLACEHOLDER_FINGERPRINT.to_string()
    }
}
