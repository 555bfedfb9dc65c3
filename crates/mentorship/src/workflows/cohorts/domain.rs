use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered entrepreneurships.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntrepreneurshipId(pub String);

impl fmt::Display for EntrepreneurshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a user of the external identity store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

/// One applicant venture being scored and allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrepreneurship {
    pub id: EntrepreneurshipId,
    pub name: String,
    pub owner_id: ActorId,
    #[serde(default)]
    pub owner_name: String,
    /// Explicit tier, present once an approval has been committed.
    #[serde(default)]
    pub tier: Option<Tier>,
}

/// Program levels, ordered from entry to most advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Starter,
    Growth,
    Scale,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Starter, Tier::Growth, Tier::Scale];

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Starter => "starter",
            Tier::Growth => "growth",
            Tier::Scale => "scale",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Tier::Starter => "Starter",
            Tier::Growth => "Growth",
            Tier::Scale => "Scale",
        }
    }

    /// Only the two lower tiers split their capacity into cohorts.
    pub const fn has_cohorts(self) -> bool {
        !matches!(self, Tier::Scale)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starter" => Ok(Tier::Starter),
            "growth" => Ok(Tier::Growth),
            "scale" => Ok(Tier::Scale),
            _ => Err(UnknownVariant {
                kind: "tier",
                value: value.to_string(),
            }),
        }
    }
}

/// Sub-group within a cohort-bearing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Cohort {
    First,
    Second,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::First, Cohort::Second];

    pub const fn number(self) -> u8 {
        match self {
            Cohort::First => 1,
            Cohort::Second => 2,
        }
    }
}

impl TryFrom<u8> for Cohort {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Cohort::First),
            2 => Ok(Cohort::Second),
            other => Err(format!("cohort must be 1 or 2, got {other}")),
        }
    }
}

impl From<Cohort> for u8 {
    fn from(value: Cohort) -> Self {
        value.number()
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationKind {
    Automatic,
    Reviewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Draft,
    Submitted,
}

/// Administrator sign-off on a reviewer evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// One scored assessment of an entrepreneurship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub entrepreneurship_id: EntrepreneurshipId,
    pub score: Option<f64>,
    pub kind: EvaluationKind,
    pub submission: SubmissionState,
    #[serde(default)]
    pub approval: ApprovalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<ActorId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    Approved,
    Rejected,
}

impl DecisionState {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionState::Approved => "approved",
            DecisionState::Rejected => "rejected",
        }
    }
}

/// Durable record of an approve/reject decision for one (entrepreneurship, tier) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaAssignment {
    pub entrepreneurship_id: EntrepreneurshipId,
    pub tier: Tier,
    #[serde(default)]
    pub cohort: Option<Cohort>,
    pub state: DecisionState,
    pub decided_by: ActorId,
    pub decided_at: DateTime<Utc>,
}

impl QuotaAssignment {
    pub fn is_approved(&self) -> bool {
        self.state == DecisionState::Approved
    }

    pub fn key(&self) -> (&EntrepreneurshipId, Tier) {
        (&self.entrepreneurship_id, self.tier)
    }
}

/// Raised when a textual tier or view mode does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_parse_case_insensitively() {
        assert_eq!(" Scale ".parse::<Tier>(), Ok(Tier::Scale));
        assert_eq!("GROWTH".parse::<Tier>(), Ok(Tier::Growth));
        let err = "elite".parse::<Tier>().expect_err("unknown tier");
        assert_eq!(err.to_string(), "unknown tier 'elite'");
    }

    #[test]
    fn cohorts_serialize_as_numbers() {
        let json = serde_json::to_string(&Cohort::Second).expect("serializes");
        assert_eq!(json, "2");
        let parsed: Cohort = serde_json::from_str("1").expect("deserializes");
        assert_eq!(parsed, Cohort::First);
        assert!(serde_json::from_str::<Cohort>("3").is_err());
    }

    #[test]
    fn only_lower_tiers_have_cohorts() {
        assert!(Tier::Starter.has_cohorts());
        assert!(Tier::Growth.has_cohorts());
        assert!(!Tier::Scale.has_cohorts());
    }
}
