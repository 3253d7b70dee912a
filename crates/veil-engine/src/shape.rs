//! Policy parameter shapes
//!
//! A shape fixes the ordered, named, kinded parameter list a policy stores
//! and the kinds of the values submitted against it. Two shapes exist: the
//! four-criteria shape consumed by the evaluation engine and the
//! three-threshold shape consumed by the tier scoring engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use veil_core::CiphertextKind;

/// One expected parameter: its audit name and ciphertext kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Stable name used in events and errors
    pub name: &'static str,
    /// Required ciphertext kind for this slot
    pub kind: CiphertextKind,
}

/// Index of the minimum-experience criterion
pub const CRITERIA_MIN_EXPERIENCE: usize = 0;
/// Index of the minimum-education criterion
pub const CRITERIA_MIN_EDUCATION: usize = 1;
/// Index of the required-skills bitmask criterion
pub const CRITERIA_REQUIRED_SKILLS: usize = 2;
/// Index of the maximum-salary criterion
pub const CRITERIA_MAX_SALARY: usize = 3;

const CRITERIA: &[ParameterSpec] = &[
    ParameterSpec {
        name: "min_experience",
        kind: CiphertextKind::U16,
    },
    ParameterSpec {
        name: "min_education",
        kind: CiphertextKind::U8,
    },
    ParameterSpec {
        name: "required_skills",
        kind: CiphertextKind::U32,
    },
    ParameterSpec {
        name: "max_salary",
        kind: CiphertextKind::U64,
    },
];

const THRESHOLDS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "threshold_1",
        kind: CiphertextKind::U64,
    },
    ParameterSpec {
        name: "threshold_2",
        kind: CiphertextKind::U64,
    },
    ParameterSpec {
        name: "threshold_3",
        kind: CiphertextKind::U64,
    },
];

/// The parameter layout a policy was created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyShape {
    /// Four pass/fail criteria: experience, education, skills mask, salary
    Criteria,
    /// Three ordered score thresholds
    Thresholds,
}

impl PolicyShape {
    /// The ordered parameter specs of this shape
    pub fn specs(&self) -> &'static [ParameterSpec] {
        match self {
            PolicyShape::Criteria => CRITERIA,
            PolicyShape::Thresholds => THRESHOLDS,
        }
    }

    /// Number of parameters this shape expects
    pub fn len(&self) -> usize {
        self.specs().len()
    }

    /// True when the shape expects no parameters
    pub fn is_empty(&self) -> bool {
        self.specs().is_empty()
    }
}

impl fmt::Display for PolicyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyShape::Criteria => f.write_str("criteria"),
            PolicyShape::Thresholds => f.write_str("thresholds"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_shape_layout() {
        let specs = PolicyShape::Criteria.specs();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[CRITERIA_MIN_EXPERIENCE].kind, CiphertextKind::U16);
        assert_eq!(specs[CRITERIA_MIN_EDUCATION].kind, CiphertextKind::U8);
        assert_eq!(specs[CRITERIA_REQUIRED_SKILLS].kind, CiphertextKind::U32);
        assert_eq!(specs[CRITERIA_MAX_SALARY].kind, CiphertextKind::U64);
    }

    #[test]
    fn threshold_shape_layout() {
        let specs = PolicyShape::Thresholds.specs();
        assert_eq!(specs.len(), 3);
        assert!(specs.iter().all(|s| s.kind == CiphertextKind::U64));
    }
}
