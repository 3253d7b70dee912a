//! Property-based checks of the evaluation semantics
//!
//! The decrypted verdict must equal the plaintext conjunction of the four
//! conditions, for arbitrary criteria and submissions, and the tier flags
//! must equal the plaintext threshold comparisons.

use proptest::prelude::*;
use veil_core::{CiphertextKind, PolicyId, PrincipalId};
use veil_engine::{EvaluationEngine, PolicyShape, PolicyStore, TierScoringEngine};
use veil_ledger::AccessControlLedger;
use veil_testkit::CleartextCoprocessor;

fn criteria_batch(values: [u64; 4]) -> Vec<(u64, CiphertextKind)> {
    values
        .iter()
        .zip(PolicyShape::Criteria.specs())
        .map(|(value, spec)| (*value, spec.kind))
        .collect()
}

proptest! {
    #[test]
    fn verdict_matches_plaintext_conjunction(
        min_experience in 0u64..=u16::MAX as u64,
        min_education in 0u64..=u8::MAX as u64,
        required_skills in 0u64..=u32::MAX as u64,
        max_salary in 0u64..=1_000_000u64,
        experience in 0u64..=u16::MAX as u64,
        education in 0u64..=u8::MAX as u64,
        skills in 0u64..=u32::MAX as u64,
        salary in 0u64..=1_000_000u64,
    ) {
        let admin = PrincipalId::new_from_entropy([1; 32]);
        let employer = PrincipalId::new_from_entropy([2; 32]);
        let subject = PrincipalId::new_from_entropy([3; 32]);
        let policy = PolicyId::new(1);
        let mut store = PolicyStore::new(admin);
        let mut engine = EvaluationEngine::new();
        let mut coproc = CleartextCoprocessor::new();
        let mut ledger = AccessControlLedger::new();

        store.create(admin, policy, employer, PolicyShape::Criteria).unwrap();
        let (raws, proof) = coproc.encrypt_all(&criteria_batch([
            min_experience, min_education, required_skills, max_salary,
        ]));
        store.set_parameters(employer, policy, &raws, &proof, &mut coproc, &mut ledger).unwrap();

        let (raws, proof) = coproc.encrypt_all(&criteria_batch([
            experience, education, skills, salary,
        ]));
        let verdict = engine
            .evaluate(subject, policy, &raws, &proof, &store, &mut coproc, &mut ledger)
            .unwrap();

        let expected = experience >= min_experience
            && education >= min_education
            && (skills & required_skills) == required_skills
            && salary <= max_salary;
        prop_assert_eq!(coproc.reveal_bool(verdict), Some(expected));

        // Decrypt-rights invariant holds for every generated case.
        prop_assert!(ledger.can_decrypt(verdict, employer));
        prop_assert!(ledger.can_decrypt(verdict, PrincipalId::SYSTEM));
        prop_assert!(!ledger.can_decrypt(verdict, subject));
    }

    #[test]
    fn tier_flags_match_plaintext_comparisons(
        t1 in 0u64..1000,
        t2 in 0u64..1000,
        t3 in 0u64..1000,
        score in 0u64..1000,
    ) {
        let admin = PrincipalId::new_from_entropy([1; 32]);
        let subject = PrincipalId::new_from_entropy([3; 32]);
        let mut engine = TierScoringEngine::new(admin);
        let mut coproc = CleartextCoprocessor::new();
        let mut ledger = AccessControlLedger::new();

        let (raws, proof) = coproc.encrypt_all(&[
            (t1, CiphertextKind::U64),
            (t2, CiphertextKind::U64),
            (t3, CiphertextKind::U64),
        ]);
        let raws = [raws[0].clone(), raws[1].clone(), raws[2].clone()];
        engine.set_thresholds(admin, &raws, &proof, &mut coproc, &mut ledger).unwrap();

        let (raw, proof) = coproc.encrypt(score, CiphertextKind::U64);
        let (_, flags) = engine
            .submit_score(subject, &raw, &proof, &mut coproc, &mut ledger)
            .unwrap();

        let expected = [score >= t1, score >= t2, score >= t3];
        for (flag, expected) in flags.iter().zip(expected) {
            prop_assert_eq!(coproc.reveal_bool(*flag), Some(expected));
            prop_assert!(ledger.is_public(*flag));
        }
    }
}
