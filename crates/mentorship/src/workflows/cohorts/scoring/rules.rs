use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::super::domain::{
    ApprovalState, EvaluationKind, EvaluationRecord, SubmissionState, UnknownVariant,
};

/// Which evaluation records count towards an aggregated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationRule {
    /// Automatic evaluations, plus reviewer evaluations that were submitted and admin-approved.
    #[default]
    Approved,
    /// Automatic evaluations, plus anything submitted regardless of admin approval.
    Submitted,
}

impl QualificationRule {
    pub fn qualifies(self, record: &EvaluationRecord) -> bool {
        if record.kind == EvaluationKind::Automatic {
            return true;
        }

        let submitted = record.submission == SubmissionState::Submitted;
        match self {
            QualificationRule::Approved => {
                record.kind == EvaluationKind::Reviewer
                    && submitted
                    && record.approval == ApprovalState::Approved
            }
            QualificationRule::Submitted => submitted,
        }
    }
}

/// How a qualifying record without a score is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullScorePolicy {
    /// Left out of both the sum and the count.
    #[default]
    Exclude,
    /// Counted as a zero score.
    CoerceZero,
}

impl NullScorePolicy {
    pub(crate) fn resolve(self, score: Option<f64>) -> Option<f64> {
        match (self, score) {
            (_, Some(score)) => Some(score),
            (NullScorePolicy::Exclude, None) => None,
            (NullScorePolicy::CoerceZero, None) => Some(0.0),
        }
    }
}

impl FromStr for NullScorePolicy {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(NullScorePolicy::Exclude),
            "zero" | "coerce_zero" => Ok(NullScorePolicy::CoerceZero),
            _ => Err(UnknownVariant {
                kind: "null score policy",
                value: value.to_string(),
            }),
        }
    }
}
