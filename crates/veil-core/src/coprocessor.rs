//! Homomorphic coprocessor collaborator interface
//!
//! The core never performs arithmetic on ciphertexts itself. Every
//! combination of encrypted values is expressed as a call through this
//! trait, which an external homomorphic engine implements. The operations
//! are pure with respect to core state: each one mints a fresh handle and
//! leaves its operands untouched.

use crate::{AttestationProof, CiphertextHandle, CiphertextKind, ExternalCiphertext, Result};

/// Fixed operation surface of the external homomorphic engine
///
/// Implementations must fail with [`VeilError::ProofInvalid`] when an
/// attestation does not verify, and with [`VeilError::KindMismatch`] when
/// operand kinds disagree with an operation's requirements.
///
/// [`VeilError::ProofInvalid`]: crate::VeilError::ProofInvalid
/// [`VeilError::KindMismatch`]: crate::VeilError::KindMismatch
pub trait Coprocessor {
    /// Verify the attestation and decode an externally-encrypted value into
    /// a fresh handle of the expected kind.
    fn ingest(
        &mut self,
        raw: &ExternalCiphertext,
        kind: CiphertextKind,
        proof: &AttestationProof,
    ) -> Result<CiphertextHandle>;

    /// Greater-or-equal comparison of two integer handles of the same kind.
    /// Returns a boolean handle.
    fn ge(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle>;

    /// Less-or-equal comparison of two integer handles of the same kind.
    /// Returns a boolean handle.
    fn le(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle>;

    /// Equality comparison of two handles of the same kind.
    /// Returns a boolean handle.
    fn eq(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle>;

    /// Bitwise AND of two integer handles of the same kind.
    /// Returns a handle of that kind.
    fn bit_and(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle>;

    /// Boolean AND of two boolean handles. Returns a boolean handle.
    fn bool_and(&mut self, a: CiphertextHandle, b: CiphertextHandle) -> Result<CiphertextHandle>;
}
