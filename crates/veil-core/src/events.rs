//! Fire-and-forget event notification
//!
//! Engines announce completed operations through an [`EventSink`]. Delivery
//! is best-effort: sinks return nothing and the core never depends on
//! delivery success. Events reference ciphertexts by handle only.

use crate::{CiphertextHandle, PolicyId, PrincipalId};
use serde::{Deserialize, Serialize};

/// Notification emitted after a state-changing operation completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeilEvent {
    /// A new live policy was created
    PolicyCreated {
        /// The policy identifier
        policy: PolicyId,
        /// The controlling principal
        controller: PrincipalId,
    },

    /// Encrypted parameters were stored on a policy
    ParametersSet {
        /// The policy identifier
        policy: PolicyId,
        /// Handles of the stored parameters, in shape order
        handles: Vec<CiphertextHandle>,
    },

    /// A policy was soft-deleted
    PolicyRemoved {
        /// The policy identifier
        policy: PolicyId,
    },

    /// A policy's parameter handles were irrevocably published
    ParametersPublished {
        /// The policy identifier
        policy: PolicyId,
    },

    /// An evaluation produced a verdict
    EvaluationCompleted {
        /// The policy evaluated against
        policy: PolicyId,
        /// Who submitted the encrypted inputs
        submitter: PrincipalId,
        /// Who may decrypt the verdict
        controller: PrincipalId,
        /// The aggregated verdict handle
        verdict: CiphertextHandle,
    },

    /// Tier thresholds were stored
    ThresholdsSet {
        /// Handles of the three thresholds
        handles: [CiphertextHandle; 3],
    },

    /// A score was submitted and scored against the thresholds
    ScoreSubmitted {
        /// Who submitted the score
        submitter: PrincipalId,
        /// The private score handle
        score: CiphertextHandle,
        /// The three public tier flag handles
        flags: [CiphertextHandle; 3],
    },
}

/// Best-effort event transport consumed by the engines
pub trait EventSink {
    /// Deliver one event. Must not fail and must not block the caller.
    fn emit(&self, event: &VeilEvent);
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn emit(&self, event: &VeilEvent) {
        (**self).emit(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: &VeilEvent) {
        (**self).emit(event);
    }
}

/// Sink that logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &VeilEvent) {
        tracing::info!(?event, "veil event");
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &VeilEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::CiphertextKind;

    #[test]
    fn events_round_trip_through_json() {
        let event = VeilEvent::EvaluationCompleted {
            policy: PolicyId::new(9),
            submitter: PrincipalId::new_from_entropy([1; 32]),
            controller: PrincipalId::new_from_entropy([2; 32]),
            verdict: CiphertextHandle::new([3; 32], CiphertextKind::Bool),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: VeilEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
