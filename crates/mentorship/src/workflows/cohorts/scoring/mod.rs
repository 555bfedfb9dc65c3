mod level;
mod rules;

pub use level::{classify, GROWTH_THRESHOLD, SCALE_THRESHOLD};
pub use rules::{NullScorePolicy, QualificationRule};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::{EntrepreneurshipId, EvaluationRecord};

/// Representative score of one entrepreneurship.
///
/// `score` is `None` when nothing qualified; it is never defaulted to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatedScore {
    pub score: Option<f64>,
    pub evaluations: usize,
}

impl AggregatedScore {
    pub fn is_evaluated(&self) -> bool {
        self.evaluations > 0
    }
}

/// Stateless aggregator applying one qualification rule and null policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreAggregator {
    rule: QualificationRule,
    null_policy: NullScorePolicy,
}

impl ScoreAggregator {
    pub fn new(rule: QualificationRule, null_policy: NullScorePolicy) -> Self {
        Self { rule, null_policy }
    }

    /// Reviewer evaluations must be admin-approved; nulls are excluded.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Submitted evaluations count without admin approval.
    pub fn ranking(null_policy: NullScorePolicy) -> Self {
        Self::new(QualificationRule::Submitted, null_policy)
    }

    pub fn rule(&self) -> QualificationRule {
        self.rule
    }

    pub fn null_policy(&self) -> NullScorePolicy {
        self.null_policy
    }

    pub fn aggregate(
        &self,
        records: &[EvaluationRecord],
        id: &EntrepreneurshipId,
    ) -> AggregatedScore {
        let mut tally = Tally::default();
        for record in records
            .iter()
            .filter(|record| &record.entrepreneurship_id == id)
        {
            self.accumulate(&mut tally, record);
        }
        tally.finish()
    }

    /// Aggregates every entrepreneurship referenced by `records` in a single pass.
    pub fn aggregate_all(&self, records: &[EvaluationRecord]) -> ScoreBook {
        let mut tallies: HashMap<EntrepreneurshipId, Tally> = HashMap::new();
        for record in records {
            let tally = tallies
                .entry(record.entrepreneurship_id.clone())
                .or_default();
            self.accumulate(tally, record);
        }

        ScoreBook {
            scores: tallies
                .into_iter()
                .map(|(id, tally)| (id, tally.finish()))
                .collect(),
        }
    }

    fn accumulate(&self, tally: &mut Tally, record: &EvaluationRecord) {
        if !self.rule.qualifies(record) {
            return;
        }
        if let Some(score) = self.null_policy.resolve(record.score) {
            tally.sum += score;
            tally.count += 1;
        }
    }
}

#[derive(Default)]
struct Tally {
    sum: f64,
    count: usize,
}

impl Tally {
    fn finish(self) -> AggregatedScore {
        if self.count == 0 {
            return AggregatedScore::default();
        }
        AggregatedScore {
            score: Some(round_to_cents(self.sum / self.count as f64)),
            evaluations: self.count,
        }
    }
}

/// Aggregated scores keyed by entrepreneurship.
#[derive(Debug, Clone, Default)]
pub struct ScoreBook {
    scores: HashMap<EntrepreneurshipId, AggregatedScore>,
}

impl ScoreBook {
    pub fn get(&self, id: &EntrepreneurshipId) -> AggregatedScore {
        self.scores.get(id).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
