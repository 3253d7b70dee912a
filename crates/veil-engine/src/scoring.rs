//! Tiered threshold scoring
//!
//! One submitted encrypted score is compared against three stored encrypted
//! thresholds, producing three independent pass flags. The raw score stays
//! private to the submitter and the system; the flags are published. A tier
//! is derivable externally as the count of true flags, but this engine
//! never computes or exposes an integer tier, so each flag stays
//! independently auditable.
//!
//! No ordering is enforced between the thresholds. If they are not strictly
//! increasing, the "more flags means higher tier" reading silently breaks;
//! that behavior is preserved as-is and recorded as an open question in
//! DESIGN.md.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veil_core::{
    AttestationProof, CiphertextHandle, CiphertextKind, Coprocessor, EventSink,
    ExternalCiphertext, PrincipalId, Result, TracingSink, VeilError, VeilEvent,
};
use veil_ledger::AccessControlLedger;

/// Two-state reentrancy latch around `submit_score`
///
/// Defense-in-depth for host runtimes that allow external callbacks
/// mid-call. Not a mutex: there is no queueing, a nested call fails
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Latch {
    Unlocked,
    Locked,
}

/// One principal's score submission and its derived tier flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// The private score handle
    pub score: CiphertextHandle,
    /// Pass flags against thresholds 1, 2, 3, in order
    pub flags: [CiphertextHandle; 3],
    /// Latched true once a result exists
    pub decided: bool,
}

/// Orchestrates threshold comparisons and the public/private rights split
#[derive(Debug)]
pub struct TierScoringEngine<S: EventSink = TracingSink> {
    administrator: PrincipalId,
    thresholds: Option<[CiphertextHandle; 3]>,
    records: HashMap<PrincipalId, ScoreRecord>,
    latch: Latch,
    sink: S,
}

impl TierScoringEngine<TracingSink> {
    /// Create an engine administered by `administrator`, logging events
    pub fn new(administrator: PrincipalId) -> Self {
        Self::with_sink(administrator, TracingSink)
    }
}

impl<S: EventSink> TierScoringEngine<S> {
    /// Create an engine with an explicit event sink
    pub fn with_sink(administrator: PrincipalId, sink: S) -> Self {
        Self {
            administrator,
            thresholds: None,
            records: HashMap::new(),
            latch: Latch::Unlocked,
            sink,
        }
    }

    /// Ingest and store the three encrypted thresholds
    ///
    /// Administrator only. Overwriting previously stored thresholds is
    /// allowed. The system principal is granted continued-use rights on
    /// each stored handle. Nothing is stored if any ingestion fails.
    pub fn set_thresholds<C: Coprocessor>(
        &mut self,
        caller: PrincipalId,
        values: &[ExternalCiphertext; 3],
        proof: &AttestationProof,
        coproc: &mut C,
        ledger: &mut AccessControlLedger,
    ) -> Result<[CiphertextHandle; 3]> {
        if caller != self.administrator {
            return Err(VeilError::authorization(
                "only the administrator may set thresholds",
            ));
        }
        let t1 = coproc.ingest(&values[0], CiphertextKind::U64, proof)?;
        let t2 = coproc.ingest(&values[1], CiphertextKind::U64, proof)?;
        let t3 = coproc.ingest(&values[2], CiphertextKind::U64, proof)?;
        let handles = [t1, t2, t3];

        for handle in handles {
            ledger.grant_self(handle);
        }
        self.thresholds = Some(handles);
        tracing::info!("thresholds set");
        self.sink.emit(&VeilEvent::ThresholdsSet { handles });
        Ok(handles)
    }

    /// Submit an encrypted score and derive the three tier flags
    ///
    /// The score receives decrypt rights for the submitter and the system
    /// only. The three flags receive system continued-use rights and are
    /// then published, irrevocably. Resubmission overwrites the caller's
    /// prior record.
    ///
    /// Reentrancy-guarded: a nested call while the latch is engaged fails
    /// with [`VeilError::Reentrancy`], and the latch is released on every
    /// exit path.
    pub fn submit_score<C: Coprocessor>(
        &mut self,
        caller: PrincipalId,
        raw_score: &ExternalCiphertext,
        proof: &AttestationProof,
        coproc: &mut C,
        ledger: &mut AccessControlLedger,
    ) -> Result<(CiphertextHandle, [CiphertextHandle; 3])> {
        if self.latch == Latch::Locked {
            return Err(VeilError::reentrancy("submit_score is already executing"));
        }
        self.latch = Latch::Locked;
        let result = self.submit_score_locked(caller, raw_score, proof, coproc, ledger);
        self.latch = Latch::Unlocked;
        if let Err(error) = &result {
            tracing::warn!(submitter = %caller, %error, "score submission failed");
        }
        result
    }

    fn submit_score_locked<C: Coprocessor>(
        &mut self,
        caller: PrincipalId,
        raw_score: &ExternalCiphertext,
        proof: &AttestationProof,
        coproc: &mut C,
        ledger: &mut AccessControlLedger,
    ) -> Result<(CiphertextHandle, [CiphertextHandle; 3])> {
        let thresholds = self
            .thresholds
            .ok_or_else(|| VeilError::validation("thresholds are not set"))?;

        let score = coproc.ingest(raw_score, CiphertextKind::U64, proof)?;
        // Three independent comparisons; no aggregation, no integer tier.
        let pass_t1 = coproc.ge(score, thresholds[0])?;
        let pass_t2 = coproc.ge(score, thresholds[1])?;
        let pass_t3 = coproc.ge(score, thresholds[2])?;
        let flags = [pass_t1, pass_t2, pass_t3];

        // Commit phase: the raw score stays private, the flags go public.
        ledger.grant_self(score);
        ledger.grant(score, caller);
        for flag in flags {
            ledger.grant_self(flag);
            ledger.publish(flag);
        }
        self.records.insert(
            caller,
            ScoreRecord {
                score,
                flags,
                decided: true,
            },
        );
        tracing::info!(
            submitter = %caller,
            score = %score.opaque_repr(),
            "score submitted"
        );
        self.sink.emit(&VeilEvent::ScoreSubmitted {
            submitter: caller,
            score,
            flags,
        });
        Ok((score, flags))
    }

    /// A caller's own record: the private score handle plus the flags
    pub fn my_handles(
        &self,
        caller: PrincipalId,
    ) -> Result<(CiphertextHandle, [CiphertextHandle; 3])> {
        self.record_of(caller)
            .map(|record| (record.score, record.flags))
    }

    /// Foreign view of a principal's record: the public flag handles only
    pub fn handles_of(&self, principal: PrincipalId) -> Result<[CiphertextHandle; 3]> {
        self.record_of(principal).map(|record| record.flags)
    }

    /// The stored threshold handles, for audit. None until set.
    pub fn thresholds(&self) -> Option<[CiphertextHandle; 3]> {
        self.thresholds
    }

    fn record_of(&self, principal: PrincipalId) -> Result<&ScoreRecord> {
        match self.records.get(&principal) {
            Some(record) if record.decided => Ok(record),
            _ => Err(VeilError::not_found(format!(
                "no decided score for {principal}"
            ))),
        }
    }

    #[cfg(test)]
    fn engage_latch(&mut self) {
        self.latch = Latch::Locked;
    }
}
