//! # Veil Engine
//!
//! The homomorphic evaluation and decryption-rights engine. Two
//! orchestrators share one policy store and one access-control ledger:
//!
//! - [`EvaluationEngine`] compares four submitted encrypted attributes
//!   against a policy's four encrypted criteria and aggregates them into a
//!   single encrypted verdict, decryptable by the policy controller only.
//! - [`TierScoringEngine`] compares one submitted encrypted score against
//!   three encrypted thresholds and publishes three independent pass flags
//!   while the raw score stays private.
//!
//! All ciphertext combination happens through the external
//! [`Coprocessor`](veil_core::Coprocessor); the engines own the wiring of
//! the comparisons and the ledger grants, and nothing else.

pub mod evaluation;
pub mod policy;
pub mod scoring;
pub mod shape;

pub use evaluation::{EvaluationEngine, Submission};
pub use policy::{Policy, PolicyStore};
pub use scoring::{ScoreRecord, TierScoringEngine};
pub use shape::{ParameterSpec, PolicyShape};
