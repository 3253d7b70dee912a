//! Policy storage and administration
//!
//! Policies are created by the store's administrator and thereafter mutated
//! only by their controlling principal. Removal is a soft delete: the
//! existence flag flips and the controller is cleared, but stored parameter
//! handles stay in place. Handles carry no exploitable plaintext, so leaving
//! them is safe and cheaper than bookkeeping their removal.

use crate::shape::PolicyShape;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veil_core::{
    AttestationProof, CiphertextHandle, Coprocessor, EventSink, ExternalCiphertext, PolicyId,
    PrincipalId, Result, TracingSink, VeilError, VeilEvent,
};
use veil_ledger::AccessControlLedger;

/// A named set of encrypted comparison parameters plus its controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// The policy identifier
    pub id: PolicyId,
    /// Who may update this policy and who receives decrypt rights on
    /// verdicts derived from it. NIL once the policy is removed.
    pub controller: PrincipalId,
    /// The parameter layout this policy was created with
    pub shape: PolicyShape,
    params: Vec<CiphertextHandle>,
    exists: bool,
}

impl Policy {
    /// True while the policy accepts evaluation and mutation
    pub fn is_live(&self) -> bool {
        self.exists
    }

    /// True once parameters have been stored
    pub fn has_parameters(&self) -> bool {
        !self.params.is_empty()
    }

    /// Stored parameter handles, in shape order. Empty until set.
    pub fn parameter_handles(&self) -> &[CiphertextHandle] {
        &self.params
    }
}

/// Keyed store of policies, guarded by an administrator principal
#[derive(Debug)]
pub struct PolicyStore<S: EventSink = TracingSink> {
    administrator: PrincipalId,
    policies: HashMap<PolicyId, Policy>,
    sink: S,
}

impl PolicyStore<TracingSink> {
    /// Create a store administered by `administrator`, logging events
    pub fn new(administrator: PrincipalId) -> Self {
        Self::with_sink(administrator, TracingSink)
    }
}

impl<S: EventSink> PolicyStore<S> {
    /// Create a store with an explicit event sink
    pub fn with_sink(administrator: PrincipalId, sink: S) -> Self {
        Self {
            administrator,
            policies: HashMap::new(),
            sink,
        }
    }

    /// Create a new live policy with no parameters yet
    ///
    /// Administrator only. Re-creating over a soft-deleted identifier is
    /// allowed and replaces the dead record.
    pub fn create(
        &mut self,
        caller: PrincipalId,
        id: PolicyId,
        controller: PrincipalId,
        shape: PolicyShape,
    ) -> Result<()> {
        if caller != self.administrator {
            return Err(VeilError::authorization(
                "only the administrator may create policies",
            ));
        }
        if id.is_zero() {
            return Err(VeilError::validation("policy id must be non-zero"));
        }
        if controller.is_nil() {
            return Err(VeilError::validation("controller must not be nil"));
        }
        if self.policies.get(&id).is_some_and(Policy::is_live) {
            return Err(VeilError::validation(format!("{id} already exists")));
        }

        self.policies.insert(
            id,
            Policy {
                id,
                controller,
                shape,
                params: Vec::new(),
                exists: true,
            },
        );
        tracing::info!(policy = %id, controller = %controller, %shape, "policy created");
        self.sink.emit(&VeilEvent::PolicyCreated {
            policy: id,
            controller,
        });
        Ok(())
    }

    /// Ingest and store the policy's encrypted parameters
    ///
    /// Controller only. Each external value is decoded with the shared
    /// proof at the kind its shape slot requires; the system principal is
    /// granted continued-use rights on every stored handle. Returns the new
    /// handles for audit without decrypting them. Nothing is stored if any
    /// ingestion fails.
    pub fn set_parameters<C: Coprocessor>(
        &mut self,
        caller: PrincipalId,
        id: PolicyId,
        values: &[ExternalCiphertext],
        proof: &AttestationProof,
        coproc: &mut C,
        ledger: &mut AccessControlLedger,
    ) -> Result<Vec<CiphertextHandle>> {
        let policy = self.live_policy(id)?;
        if caller != policy.controller {
            return Err(VeilError::authorization(
                "only the controlling principal may set parameters",
            ));
        }
        let shape = policy.shape;
        if values.len() != shape.len() {
            return Err(VeilError::validation(format!(
                "{shape} shape expects {} values, got {}",
                shape.len(),
                values.len()
            )));
        }

        let mut handles = Vec::with_capacity(values.len());
        for (value, spec) in values.iter().zip(shape.specs()) {
            handles.push(coproc.ingest(value, spec.kind, proof)?);
        }

        for handle in &handles {
            ledger.grant_self(*handle);
        }
        // Safe: live_policy above proved the entry is present.
        if let Some(policy) = self.policies.get_mut(&id) {
            policy.params = handles.clone();
        }
        tracing::info!(policy = %id, count = handles.len(), "parameters set");
        self.sink.emit(&VeilEvent::ParametersSet {
            policy: id,
            handles: handles.clone(),
        });
        Ok(handles)
    }

    /// Reassign the controlling principal
    pub fn set_controller(
        &mut self,
        caller: PrincipalId,
        id: PolicyId,
        new_controller: PrincipalId,
    ) -> Result<()> {
        let policy = self.live_policy(id)?;
        if caller != policy.controller {
            return Err(VeilError::authorization(
                "only the controlling principal may reassign control",
            ));
        }
        if new_controller.is_nil() {
            return Err(VeilError::validation("controller must not be nil"));
        }
        if let Some(policy) = self.policies.get_mut(&id) {
            policy.controller = new_controller;
        }
        tracing::info!(policy = %id, controller = %new_controller, "controller reassigned");
        Ok(())
    }

    /// Soft-delete the policy
    ///
    /// The existence flag flips and the controller clears to NIL; stored
    /// handles are left in place but become unreachable through lookup.
    pub fn remove(&mut self, caller: PrincipalId, id: PolicyId) -> Result<()> {
        let policy = self.live_policy(id)?;
        if caller != policy.controller {
            return Err(VeilError::authorization(
                "only the controlling principal may remove a policy",
            ));
        }
        if let Some(policy) = self.policies.get_mut(&id) {
            policy.exists = false;
            policy.controller = PrincipalId::NIL;
        }
        tracing::info!(policy = %id, "policy removed");
        self.sink.emit(&VeilEvent::PolicyRemoved { policy: id });
        Ok(())
    }

    /// Irrevocably mark every stored parameter handle public
    ///
    /// Controller only. Intended for demonstration and audit; once public,
    /// any principal may decrypt the parameters, so this is a deliberate,
    /// high-visibility action and never the default.
    pub fn publish_parameters(
        &mut self,
        caller: PrincipalId,
        id: PolicyId,
        ledger: &mut AccessControlLedger,
    ) -> Result<()> {
        let policy = self.live_policy(id)?;
        if caller != policy.controller {
            return Err(VeilError::authorization(
                "only the controlling principal may publish parameters",
            ));
        }
        let handles: Vec<CiphertextHandle> = policy.params.clone();
        for handle in handles {
            ledger.publish(handle);
        }
        tracing::info!(policy = %id, "parameters published");
        self.sink.emit(&VeilEvent::ParametersPublished { policy: id });
        Ok(())
    }

    /// Stored parameter handles of a live policy. Open to anyone; returns
    /// handles only, never plaintext.
    pub fn parameter_handles(&self, id: PolicyId) -> Result<&[CiphertextHandle]> {
        Ok(self.live_policy(id)?.parameter_handles())
    }

    /// Look up a live policy
    pub fn live_policy(&self, id: PolicyId) -> Result<&Policy> {
        match self.policies.get(&id) {
            Some(policy) if policy.is_live() => Ok(policy),
            _ => Err(VeilError::not_found(format!("{id} is not live"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use veil_core::CiphertextKind;
    use veil_testkit::CleartextCoprocessor;

    fn admin() -> PrincipalId {
        PrincipalId::new_from_entropy([1; 32])
    }

    fn employer() -> PrincipalId {
        PrincipalId::new_from_entropy([2; 32])
    }

    fn criteria_values(
        coproc: &mut CleartextCoprocessor,
        values: [u64; 4],
    ) -> (Vec<ExternalCiphertext>, AttestationProof) {
        let pairs: Vec<(u64, veil_core::CiphertextKind)> = values
            .iter()
            .zip(PolicyShape::Criteria.specs())
            .map(|(value, spec)| (*value, spec.kind))
            .collect();
        coproc.encrypt_all(&pairs)
    }

    #[test]
    fn create_rejects_zero_id_nil_controller_and_duplicates() {
        let mut store = PolicyStore::new(admin());
        assert_matches!(
            store.create(admin(), PolicyId::new(0), employer(), PolicyShape::Criteria),
            Err(VeilError::Validation { .. })
        );
        assert_matches!(
            store.create(admin(), PolicyId::new(1), PrincipalId::NIL, PolicyShape::Criteria),
            Err(VeilError::Validation { .. })
        );
        store
            .create(admin(), PolicyId::new(1), employer(), PolicyShape::Criteria)
            .unwrap();
        assert_matches!(
            store.create(admin(), PolicyId::new(1), employer(), PolicyShape::Criteria),
            Err(VeilError::Validation { .. })
        );
    }

    #[test]
    fn create_requires_the_administrator() {
        let mut store = PolicyStore::new(admin());
        assert_matches!(
            store.create(employer(), PolicyId::new(1), employer(), PolicyShape::Criteria),
            Err(VeilError::Authorization { .. })
        );
    }

    #[test]
    fn recreate_over_soft_deleted_id_is_allowed() {
        let mut store = PolicyStore::new(admin());
        let id = PolicyId::new(1);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();
        store.remove(employer(), id).unwrap();
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();
        assert!(store.live_policy(id).is_ok());
    }

    #[test]
    fn set_parameters_stores_handles_and_grants_system() {
        let mut store = PolicyStore::new(admin());
        let mut coproc = CleartextCoprocessor::new();
        let mut ledger = AccessControlLedger::new();
        let id = PolicyId::new(7);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();

        let (raws, proof) = criteria_values(&mut coproc, [3, 2, 0b0110, 100_000]);
        let handles = store
            .set_parameters(employer(), id, &raws, &proof, &mut coproc, &mut ledger)
            .unwrap();

        assert_eq!(handles.len(), 4);
        assert_eq!(store.parameter_handles(id).unwrap(), handles.as_slice());
        for handle in &handles {
            assert!(ledger.can_decrypt(*handle, PrincipalId::SYSTEM));
            assert!(!ledger.can_decrypt(*handle, employer()));
        }
    }

    #[test]
    fn set_parameters_rejects_wrong_arity_and_wrong_caller() {
        let mut store = PolicyStore::new(admin());
        let mut coproc = CleartextCoprocessor::new();
        let mut ledger = AccessControlLedger::new();
        let id = PolicyId::new(8);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();

        let (raw, proof) = coproc.encrypt(3, CiphertextKind::U16);
        assert_matches!(
            store.set_parameters(employer(), id, &[raw], &proof, &mut coproc, &mut ledger),
            Err(VeilError::Validation { .. })
        );

        let (raws, proof) = criteria_values(&mut coproc, [3, 2, 0b0110, 100_000]);
        assert_matches!(
            store.set_parameters(admin(), id, &raws, &proof, &mut coproc, &mut ledger),
            Err(VeilError::Authorization { .. })
        );
        assert!(!store.live_policy(id).unwrap().has_parameters());
    }

    #[test]
    fn set_parameters_stores_nothing_on_bad_proof() {
        let mut store = PolicyStore::new(admin());
        let mut coproc = CleartextCoprocessor::new();
        let mut ledger = AccessControlLedger::new();
        let id = PolicyId::new(9);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();

        let (raws, _) = criteria_values(&mut coproc, [3, 2, 0b0110, 100_000]);
        let bad = AttestationProof(vec![0u8; 32]);
        assert_matches!(
            store.set_parameters(employer(), id, &raws, &bad, &mut coproc, &mut ledger),
            Err(VeilError::ProofInvalid { .. })
        );
        assert!(!store.live_policy(id).unwrap().has_parameters());
    }

    #[test]
    fn publish_parameters_makes_every_stored_handle_public() {
        let mut store = PolicyStore::new(admin());
        let mut coproc = CleartextCoprocessor::new();
        let mut ledger = AccessControlLedger::new();
        let stranger = PrincipalId::new_from_entropy([8; 32]);
        let id = PolicyId::new(10);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();
        let (raws, proof) = criteria_values(&mut coproc, [3, 2, 0b0110, 100_000]);
        let handles = store
            .set_parameters(employer(), id, &raws, &proof, &mut coproc, &mut ledger)
            .unwrap();

        // Controller-only, like every other mutation.
        assert_matches!(
            store.publish_parameters(admin(), id, &mut ledger),
            Err(VeilError::Authorization { .. })
        );
        for handle in &handles {
            assert!(!ledger.is_public(*handle));
        }

        store.publish_parameters(employer(), id, &mut ledger).unwrap();
        for handle in handles {
            assert!(ledger.is_public(handle));
            assert!(ledger.can_decrypt(handle, stranger));
        }
    }

    #[test]
    fn set_controller_then_old_controller_loses_rights() {
        let mut store = PolicyStore::new(admin());
        let id = PolicyId::new(3);
        let new_controller = PrincipalId::new_from_entropy([9; 32]);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();
        store.set_controller(employer(), id, new_controller).unwrap();
        assert_matches!(
            store.set_controller(employer(), id, employer()),
            Err(VeilError::Authorization { .. })
        );
        assert_eq!(store.live_policy(id).unwrap().controller, new_controller);
    }

    #[test]
    fn removed_policy_rejects_every_operation() {
        let mut store = PolicyStore::new(admin());
        let mut ledger = AccessControlLedger::new();
        let id = PolicyId::new(4);
        store
            .create(admin(), id, employer(), PolicyShape::Criteria)
            .unwrap();
        store.remove(employer(), id).unwrap();

        assert_matches!(store.live_policy(id), Err(VeilError::NotFound { .. }));
        assert_matches!(store.parameter_handles(id), Err(VeilError::NotFound { .. }));
        assert_matches!(
            store.set_controller(employer(), id, employer()),
            Err(VeilError::NotFound { .. })
        );
        assert_matches!(
            store.publish_parameters(employer(), id, &mut ledger),
            Err(VeilError::NotFound { .. })
        );
        assert_matches!(store.remove(employer(), id), Err(VeilError::NotFound { .. }));
    }

    #[test]
    fn parameter_handles_are_readable_by_anyone_without_decryption() {
        let mut store = PolicyStore::new(admin());
        let id = PolicyId::new(5);
        store
            .create(admin(), id, employer(), PolicyShape::Thresholds)
            .unwrap();
        // No parameters yet: empty slice, not an error.
        assert!(store.parameter_handles(id).unwrap().is_empty());
    }

    #[test]
    fn handle_kind_check_applies_per_slot() {
        let mut coproc = CleartextCoprocessor::new();
        // A U8 payload in a U16 slot is a kind mismatch at ingest.
        let (raw, proof) = coproc.encrypt(3, CiphertextKind::U8);
        assert_matches!(
            coproc.ingest(&raw, CiphertextKind::U16, &proof),
            Err(VeilError::KindMismatch { .. })
        );
    }
}
