//! Core identifier types used across the Veil workspace
//!
//! Principals are the parties of the protocol: subjects who submit encrypted
//! values, controllers who own policies, and the reserved system principal
//! that models the engines' own continued-use rights on ciphertexts.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

fn derived_uuid(entropy: &[u8]) -> Uuid {
    let digest = Sha256::digest(entropy);
    let mut uuid_bytes = [0u8; 16];
    uuid_bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(uuid_bytes)
}

/// Identifies a party that can submit ciphertexts, control policies, or
/// receive decrypt rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// The empty principal. Rejected by every validation path; used as the
    /// cleared controller of a soft-deleted policy.
    pub const NIL: PrincipalId = PrincipalId(Uuid::nil());

    /// The reserved system principal. A grant to this principal means "the
    /// evaluation engines may keep using this ciphertext as an operand",
    /// distinct from decrypt-by-external-party rights.
    pub const SYSTEM: PrincipalId = PrincipalId(Uuid::from_u128(u128::MAX));

    /// Create a new random principal ID
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a principal ID deterministically from entropy
    pub fn new_from_entropy(entropy: [u8; 32]) -> Self {
        Self(derived_uuid(&entropy))
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// True for the empty principal
    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "principal-{}", self.0)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifies a stored policy. Zero is never a valid identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyId(pub u64);

impl PolicyId {
    /// Create from a raw identifier
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// True for the zero identifier, which no live policy may carry
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy-{}", self.0)
    }
}

impl From<u64> for PolicyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_derivation_is_deterministic() {
        let a = PrincipalId::new_from_entropy([7u8; 32]);
        let b = PrincipalId::new_from_entropy([7u8; 32]);
        let c = PrincipalId::new_from_entropy([8u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn reserved_principals_are_distinct() {
        assert_ne!(PrincipalId::NIL, PrincipalId::SYSTEM);
        assert!(PrincipalId::NIL.is_nil());
        assert!(!PrincipalId::SYSTEM.is_nil());
    }
}
