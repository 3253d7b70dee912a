//! Multi-condition homomorphic evaluation
//!
//! Evaluates four encrypted submitted attributes against a policy's four
//! encrypted criteria and aggregates the comparisons into one encrypted
//! verdict. All four comparisons are always computed; homomorphic values
//! carry no control flow, so there is no early exit to take, and a real
//! cryptographic backend would leak through one anyway.
//!
//! Decrypt rights on the verdict go to the policy's controlling principal
//! and the system. Never to the submitter.

use crate::policy::PolicyStore;
use crate::shape::{
    PolicyShape, CRITERIA_MAX_SALARY, CRITERIA_MIN_EDUCATION, CRITERIA_MIN_EXPERIENCE,
    CRITERIA_REQUIRED_SKILLS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veil_core::{
    AttestationProof, CiphertextHandle, Coprocessor, EventSink, ExternalCiphertext, PolicyId,
    PrincipalId, Result, TracingSink, VeilError, VeilEvent,
};
use veil_ledger::AccessControlLedger;

/// One principal's encrypted inputs and the verdict derived from them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Who submitted the inputs
    pub submitter: PrincipalId,
    /// Ingested input handles, in shape order
    pub inputs: Vec<CiphertextHandle>,
    /// The aggregated verdict handle
    pub verdict: CiphertextHandle,
    /// Latched true once a result exists; resubmission overwrites the rest
    pub decided: bool,
}

/// Orchestrates criteria evaluation and verdict decrypt-rights wiring
#[derive(Debug)]
pub struct EvaluationEngine<S: EventSink = TracingSink> {
    submissions: HashMap<(PolicyId, PrincipalId), Submission>,
    sink: S,
}

impl EvaluationEngine<TracingSink> {
    /// Create an engine that logs events
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }
}

impl Default for EvaluationEngine<TracingSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EvaluationEngine<S> {
    /// Create an engine with an explicit event sink
    pub fn with_sink(sink: S) -> Self {
        Self {
            submissions: HashMap::new(),
            sink,
        }
    }

    /// Evaluate four submitted encrypted attributes against a live policy
    ///
    /// Inputs arrive in criteria order: experience, education, skills mask,
    /// salary, attested by one shared proof. The verdict decrypts to true
    /// iff all four conditions hold:
    ///
    /// - experience ≥ `min_experience`
    /// - education ≥ `min_education`
    /// - skills mask contains every bit of `required_skills`
    /// - salary ≤ `max_salary`
    ///
    /// All-or-nothing: every coprocessor call completes before any grant or
    /// record is written, so a failed call retains nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate<C: Coprocessor, PS: EventSink>(
        &mut self,
        caller: PrincipalId,
        policy_id: PolicyId,
        inputs: &[ExternalCiphertext],
        proof: &AttestationProof,
        store: &PolicyStore<PS>,
        coproc: &mut C,
        ledger: &mut AccessControlLedger,
    ) -> Result<CiphertextHandle> {
        let result = self.evaluate_inner(caller, policy_id, inputs, proof, store, coproc, ledger);
        if let Err(error) = &result {
            tracing::warn!(policy = %policy_id, submitter = %caller, %error, "evaluation failed");
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_inner<C: Coprocessor, PS: EventSink>(
        &mut self,
        caller: PrincipalId,
        policy_id: PolicyId,
        inputs: &[ExternalCiphertext],
        proof: &AttestationProof,
        store: &PolicyStore<PS>,
        coproc: &mut C,
        ledger: &mut AccessControlLedger,
    ) -> Result<CiphertextHandle> {
        let policy = store.live_policy(policy_id)?;
        if policy.shape != PolicyShape::Criteria {
            return Err(VeilError::validation(format!(
                "{policy_id} is a {} policy, not evaluable criteria",
                policy.shape
            )));
        }
        if !policy.has_parameters() {
            return Err(VeilError::validation(format!(
                "{policy_id} has no parameters set"
            )));
        }
        let shape = policy.shape;
        if inputs.len() != shape.len() {
            return Err(VeilError::validation(format!(
                "expected {} inputs, got {}",
                shape.len(),
                inputs.len()
            )));
        }
        let controller = policy.controller;
        let criteria = policy.parameter_handles().to_vec();

        let mut submitted = Vec::with_capacity(inputs.len());
        for (input, spec) in inputs.iter().zip(shape.specs()) {
            submitted.push(coproc.ingest(input, spec.kind, proof)?);
        }

        // All four conditions are computed unconditionally.
        let experience_ok = coproc.ge(
            submitted[CRITERIA_MIN_EXPERIENCE],
            criteria[CRITERIA_MIN_EXPERIENCE],
        )?;
        let education_ok = coproc.ge(
            submitted[CRITERIA_MIN_EDUCATION],
            criteria[CRITERIA_MIN_EDUCATION],
        )?;
        // Containment, not equality: a superset of the required bits passes.
        let masked = coproc.bit_and(
            submitted[CRITERIA_REQUIRED_SKILLS],
            criteria[CRITERIA_REQUIRED_SKILLS],
        )?;
        let skills_ok = coproc.eq(masked, criteria[CRITERIA_REQUIRED_SKILLS])?;
        let salary_ok = coproc.le(submitted[CRITERIA_MAX_SALARY], criteria[CRITERIA_MAX_SALARY])?;

        let left = coproc.bool_and(experience_ok, education_ok)?;
        let right = coproc.bool_and(skills_ok, salary_ok)?;
        let verdict = coproc.bool_and(left, right)?;

        // Commit phase: grants and the record, nothing fallible below.
        // Stored inputs stay readable by their submitter and reusable by
        // the system; the verdict goes to the controller and the system.
        for input in &submitted {
            ledger.grant_self(*input);
            ledger.grant(*input, caller);
        }
        ledger.grant_self(verdict);
        ledger.grant(verdict, controller);
        self.submissions.insert(
            (policy_id, caller),
            Submission {
                submitter: caller,
                inputs: submitted,
                verdict,
                decided: true,
            },
        );
        tracing::info!(
            policy = %policy_id,
            submitter = %caller,
            verdict = %verdict.opaque_repr(),
            "evaluation completed"
        );
        self.sink.emit(&VeilEvent::EvaluationCompleted {
            policy: policy_id,
            submitter: caller,
            controller,
            verdict,
        });
        Ok(verdict)
    }

    /// A caller's own submission against a policy: inputs and verdict
    pub fn my_submission(&self, policy_id: PolicyId, caller: PrincipalId) -> Result<&Submission> {
        self.submissions
            .get(&(policy_id, caller))
            .ok_or_else(|| VeilError::not_found(format!("no submission for {policy_id}")))
    }

    /// Foreign view of a submission: the verdict handle only
    pub fn verdict_of(&self, policy_id: PolicyId, submitter: PrincipalId) -> Result<CiphertextHandle> {
        self.my_submission(policy_id, submitter)
            .map(|submission| submission.verdict)
    }
}
