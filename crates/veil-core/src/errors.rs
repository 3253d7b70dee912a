//! Unified error system for Veil
//!
//! A single error type shared by every crate in the workspace. Each variant
//! carries only a human-readable reason string; ciphertext bytes and partial
//! results never appear in error payloads.

use serde::{Deserialize, Serialize};

/// Unified error type for all Veil operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VeilError {
    /// Malformed identifier, duplicate creation, or ill-shaped input
    #[error("Invalid: {message}")]
    Validation {
        /// Error message describing the invalid input
        message: String,
    },

    /// Operation on a missing or soft-deleted resource
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Caller is not the required administrator or controlling principal
    #[error("Not authorized: {message}")]
    Authorization {
        /// Error message describing the authorization failure
        message: String,
    },

    /// Attestation proof failed to verify for a submitted ciphertext
    #[error("Proof invalid: {message}")]
    ProofInvalid {
        /// Error message describing the attestation failure
        message: String,
    },

    /// Nested call detected while the reentrancy latch was engaged
    #[error("Reentrant call: {message}")]
    Reentrancy {
        /// Error message describing the reentrant call
        message: String,
    },

    /// Coprocessor operand kinds disagree
    #[error("Kind mismatch: {message}")]
    KindMismatch {
        /// Error message describing the operand disagreement
        message: String,
    },
}

impl VeilError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create a proof-invalid error
    pub fn proof_invalid(message: impl Into<String>) -> Self {
        Self::ProofInvalid {
            message: message.into(),
        }
    }

    /// Create a reentrancy error
    pub fn reentrancy(message: impl Into<String>) -> Self {
        Self::Reentrancy {
            message: message.into(),
        }
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(message: impl Into<String>) -> Self {
        Self::KindMismatch {
            message: message.into(),
        }
    }
}

/// Standard Result type for Veil operations
pub type Result<T> = std::result::Result<T, VeilError>;
