//! Opaque ciphertext handles
//!
//! A [`CiphertextHandle`] is the only way encrypted values move through the
//! core: an immutable 32-byte identifier tagged with a kind. No plaintext
//! accessor exists on this type, or anywhere else in the core crates. The
//! only component that can turn a handle back into a value is an external
//! coprocessor, gated by the access-control ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit-width or boolean kind carried by every ciphertext handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CiphertextKind {
    /// Encrypted 8-bit unsigned integer
    U8,
    /// Encrypted 16-bit unsigned integer
    U16,
    /// Encrypted 32-bit unsigned integer
    U32,
    /// Encrypted 64-bit unsigned integer
    U64,
    /// Encrypted boolean
    Bool,
}

impl CiphertextKind {
    /// True for the integer kinds that support bitwise operations
    pub fn is_integer(&self) -> bool {
        !matches!(self, CiphertextKind::Bool)
    }
}

impl fmt::Display for CiphertextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CiphertextKind::U8 => "euint8",
            CiphertextKind::U16 => "euint16",
            CiphertextKind::U32 => "euint32",
            CiphertextKind::U64 => "euint64",
            CiphertextKind::Bool => "ebool",
        };
        f.write_str(name)
    }
}

/// Opaque, immutable reference to an encrypted value
///
/// Minted only by a [`Coprocessor`](crate::Coprocessor) implementation.
/// Handles outlive the records that first reference them; their only
/// lifecycle events are "referenced" and "becomes decryptable to a given
/// principal" (tracked by the ledger, not here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CiphertextHandle {
    id: [u8; 32],
    kind: CiphertextKind,
}

impl CiphertextHandle {
    /// Construct a handle from a coprocessor-issued identifier
    pub fn new(id: [u8; 32], kind: CiphertextKind) -> Self {
        Self { id, kind }
    }

    /// The kind tag carried by this handle
    pub fn kind(&self) -> CiphertextKind {
        self.kind
    }

    /// Fixed-size identifier for audit and display. Never plaintext.
    pub fn opaque_repr(&self) -> String {
        hex::encode(self.id)
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, &self.opaque_repr()[..16])
    }
}

/// Externally-encrypted value as received from a subject, before ingestion
///
/// The bytes are opaque to the core; only a coprocessor can decode them,
/// and only together with a verifying [`AttestationProof`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCiphertext(pub Vec<u8>);

/// Evidence that an external ciphertext was properly formed
///
/// Verified by the coprocessor, never by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationProof(pub Vec<u8>);
