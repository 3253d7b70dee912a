//! # Veil Core
//!
//! Shared vocabulary for the Veil confidential evaluation engine: opaque
//! ciphertext handles, principal and policy identifiers, the unified error
//! type, the homomorphic coprocessor collaborator trait, and event types.
//!
//! Nothing in this crate (or any crate that depends on it) can read the
//! plaintext of an encrypted value. Sensitive values exist only as
//! [`CiphertextHandle`]s that are combined through [`Coprocessor`] calls
//! and decrypted, if ever, outside the core under ledger control.

pub mod coprocessor;
pub mod errors;
pub mod events;
pub mod handle;
pub mod identifiers;

pub use coprocessor::Coprocessor;
pub use errors::{Result, VeilError};
pub use events::{EventSink, NullSink, TracingSink, VeilEvent};
pub use handle::{AttestationProof, CiphertextHandle, CiphertextKind, ExternalCiphertext};
pub use identifiers::{PolicyId, PrincipalId};
