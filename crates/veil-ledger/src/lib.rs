//! # Veil Ledger
//!
//! The access-control ledger is the confidentiality boundary of the system:
//! it records, per ciphertext handle, exactly which principals may obtain
//! the plaintext, plus a public-decryptable flag.
//!
//! The ledger is append-only. Grants are additive and idempotent, and no
//! revocation operation exists. This is a deliberate constraint of the
//! modeled system: a principal granted rights to a handle keeps them for
//! that handle's lifetime. Publishing is likewise irrevocable.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use veil_core::{CiphertextHandle, PrincipalId};

/// Decrypt-rights record for one ciphertext handle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    granted: BTreeSet<PrincipalId>,
    is_public: bool,
}

/// Per-ciphertext set of principals with decrypt rights
///
/// A handle unknown to the ledger is decryptable by nobody. Every derived
/// ciphertext an engine returns or stores must receive at least one explicit
/// grant before the operation that created it returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControlLedger {
    entries: HashMap<CiphertextHandle, Entry>,
}

impl AccessControlLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `principal` to the handle's grant-set. Idempotent.
    pub fn grant(&mut self, handle: CiphertextHandle, principal: PrincipalId) {
        let entry = self.entries.entry(handle).or_default();
        if entry.granted.insert(principal) {
            tracing::debug!(handle = %handle, principal = %principal, "decrypt right granted");
        }
    }

    /// Grant the reserved system principal continued-use rights on a handle,
    /// so later operations can reuse the value as an operand without
    /// re-ingesting it.
    pub fn grant_self(&mut self, handle: CiphertextHandle) {
        self.grant(handle, PrincipalId::SYSTEM);
    }

    /// Mark the handle decryptable by any principal. Irrevocable.
    pub fn publish(&mut self, handle: CiphertextHandle) {
        let entry = self.entries.entry(handle).or_default();
        if !entry.is_public {
            entry.is_public = true;
            tracing::debug!(handle = %handle, "handle published");
        }
    }

    /// True iff the handle is public or the principal holds a grant
    pub fn can_decrypt(&self, handle: CiphertextHandle, principal: PrincipalId) -> bool {
        self.entries
            .get(&handle)
            .is_some_and(|entry| entry.is_public || entry.granted.contains(&principal))
    }

    /// True iff the handle has been published
    pub fn is_public(&self, handle: CiphertextHandle) -> bool {
        self.entries
            .get(&handle)
            .is_some_and(|entry| entry.is_public)
    }

    /// The principals explicitly granted on a handle, for audit. Does not
    /// reflect the public flag.
    pub fn grants_of(&self, handle: CiphertextHandle) -> Vec<PrincipalId> {
        self.entries
            .get(&handle)
            .map(|entry| entry.granted.iter().copied().collect())
            .unwrap_or_default()
    }
}
