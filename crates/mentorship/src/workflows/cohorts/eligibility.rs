use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::{Entrepreneurship, EntrepreneurshipId, QuotaAssignment, Tier, UnknownVariant};
use super::scoring::{classify, AggregatedScore, ScoreBook};

/// Which slice of the program an administrator is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    All,
    Beneficiaries,
    Candidates,
}

impl FromStr for ViewMode {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ViewMode::All),
            "beneficiaries" => Ok(ViewMode::Beneficiaries),
            "candidates" => Ok(ViewMode::Candidates),
            _ => Err(UnknownVariant {
                kind: "view mode",
                value: value.to_string(),
            }),
        }
    }
}

/// An entrepreneurship annotated with the data every view needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopedEntrepreneurship {
    pub entrepreneurship: Entrepreneurship,
    pub aggregate: AggregatedScore,
    pub effective_tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<QuotaAssignment>,
}

impl ScopedEntrepreneurship {
    pub fn is_beneficiary(&self) -> bool {
        self.beneficiary.is_some()
    }
}

/// Approved assignment that decides an entrepreneurship's tier.
///
/// When several tiers were approved over time the latest decision wins.
pub fn beneficiary_assignments(
    assignments: &[QuotaAssignment],
) -> HashMap<&EntrepreneurshipId, &QuotaAssignment> {
    let mut current: HashMap<&EntrepreneurshipId, &QuotaAssignment> = HashMap::new();
    for assignment in assignments.iter().filter(|a| a.is_approved()) {
        current
            .entry(&assignment.entrepreneurship_id)
            .and_modify(|existing| {
                if assignment.decided_at > existing.decided_at {
                    *existing = assignment;
                }
            })
            .or_insert(assignment);
    }
    current
}

/// Tier used for a non-beneficiary: the explicit field, else the classified score.
fn candidate_tier(entrepreneurship: &Entrepreneurship, aggregate: &AggregatedScore) -> Option<Tier> {
    entrepreneurship
        .tier
        .or_else(|| aggregate.score.map(classify))
}

/// Pure filter/annotate pass over one snapshot of the store.
pub fn scope_entrepreneurships(
    mode: ViewMode,
    tier_filter: Option<Tier>,
    entrepreneurships: &[Entrepreneurship],
    scores: &ScoreBook,
    assignments: &[QuotaAssignment],
) -> Vec<ScopedEntrepreneurship> {
    let beneficiaries = beneficiary_assignments(assignments);

    entrepreneurships
        .iter()
        .filter_map(|entrepreneurship| {
            let aggregate = scores.get(&entrepreneurship.id);
            let beneficiary = beneficiaries.get(&entrepreneurship.id).copied();

            let in_base_set = match mode {
                ViewMode::All => true,
                ViewMode::Beneficiaries => beneficiary.is_some(),
                ViewMode::Candidates => beneficiary.is_none(),
            };
            if !in_base_set {
                return None;
            }

            let effective_tier = match beneficiary {
                Some(assignment) => Some(assignment.tier),
                None => candidate_tier(entrepreneurship, &aggregate),
            };

            if let Some(wanted) = tier_filter {
                if effective_tier != Some(wanted) {
                    return None;
                }
                // Unscored candidates have no tier to be filtered on.
                if mode == ViewMode::Candidates && !aggregate.is_evaluated() {
                    return None;
                }
            }

            Some(ScopedEntrepreneurship {
                entrepreneurship: entrepreneurship.clone(),
                aggregate,
                effective_tier,
                beneficiary: beneficiary.cloned(),
            })
        })
        .collect()
}
