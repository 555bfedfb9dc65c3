use serde::Serialize;

use super::domain::{Entrepreneurship, EntrepreneurshipId, EvaluationRecord};
use super::scoring::{NullScorePolicy, ScoreAggregator};

pub const DEFAULT_RANKING_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub position: usize,
    pub entrepreneurship_id: EntrepreneurshipId,
    pub name: String,
    pub owner_name: String,
    pub score: f64,
    pub evaluations: usize,
}

/// Orders evaluated entrepreneurships by aggregated score.
#[derive(Debug, Clone, Copy)]
pub struct RankingBuilder {
    aggregator: ScoreAggregator,
    limit: usize,
}

impl Default for RankingBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RANKING_SIZE, NullScorePolicy::default())
    }
}

impl RankingBuilder {
    pub fn new(limit: usize, null_policy: NullScorePolicy) -> Self {
        Self {
            aggregator: ScoreAggregator::ranking(null_policy),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Entries without a qualifying evaluation are left out. Equal scores keep the
    /// order in which `entrepreneurships` was given.
    pub fn build(
        &self,
        entrepreneurships: &[Entrepreneurship],
        records: &[EvaluationRecord],
    ) -> Vec<RankingEntry> {
        let scores = self.aggregator.aggregate_all(records);

        let mut scored: Vec<(&Entrepreneurship, f64, usize)> = entrepreneurships
            .iter()
            .filter_map(|entrepreneurship| {
                let aggregate = scores.get(&entrepreneurship.id);
                aggregate
                    .score
                    .map(|score| (entrepreneurship, score, aggregate.evaluations))
            })
            .collect();

        scored.sort_by(|left, right| right.1.total_cmp(&left.1));

        scored
            .into_iter()
            .take(self.limit)
            .enumerate()
            .map(|(index, (entrepreneurship, score, evaluations))| RankingEntry {
                position: index + 1,
                entrepreneurship_id: entrepreneurship.id.clone(),
                name: entrepreneurship.name.clone(),
                owner_name: entrepreneurship.owner_name.clone(),
                score,
                evaluations,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::cohorts::domain::{
        ActorId, ApprovalState, EvaluationKind, SubmissionState,
    };

    fn venture(id: &str) -> Entrepreneurship {
        Entrepreneurship {
            id: EntrepreneurshipId(id.to_string()),
            name: format!("Venture {id}"),
            owner_id: ActorId(format!("user-{id}")),
            owner_name: format!("Owner {id}"),
            tier: None,
        }
    }

    fn review(id: &str, score: Option<f64>, submission: SubmissionState) -> EvaluationRecord {
        EvaluationRecord {
            entrepreneurship_id: EntrepreneurshipId(id.to_string()),
            score,
            kind: EvaluationKind::Reviewer,
            submission,
            approval: ApprovalState::Pending,
            reviewer_id: Some(ActorId("reviewer".to_string())),
        }
    }

    fn positions(entries: &[RankingEntry]) -> Vec<(usize, &str)> {
        entries
            .iter()
            .map(|entry| (entry.position, entry.entrepreneurship_id.0.as_str()))
            .collect()
    }

    #[test]
    fn orders_by_score_and_skips_unevaluated() {
        let ventures = vec![venture("a"), venture("b"), venture("c"), venture("f")];
        let records = vec![
            review("a", Some(55.0), SubmissionState::Submitted),
            review("b", Some(91.0), SubmissionState::Submitted),
            review("c", Some(70.0), SubmissionState::Submitted),
            review("c", Some(80.0), SubmissionState::Submitted),
            review("f", Some(99.0), SubmissionState::Draft),
        ];

        let ranking = RankingBuilder::default().build(&ventures, &records);
        assert_eq!(positions(&ranking), vec![(1, "b"), (2, "c"), (3, "a")]);
        assert_eq!(ranking[1].score, 75.0);
        assert_eq!(ranking[1].evaluations, 2);
        assert_eq!(ranking[1].owner_name, "Owner c");
    }

    #[test]
    fn ties_keep_input_order_and_results_repeat() {
        let ventures = vec![venture("x"), venture("y"), venture("z")];
        let records = vec![
            review("z", Some(60.0), SubmissionState::Submitted),
            review("y", Some(60.0), SubmissionState::Submitted),
            review("x", Some(60.0), SubmissionState::Submitted),
        ];

        let builder = RankingBuilder::default();
        let first = builder.build(&ventures, &records);
        assert_eq!(positions(&first), vec![(1, "x"), (2, "y"), (3, "z")]);
        assert_eq!(first, builder.build(&ventures, &records));
    }

    #[test]
    fn truncates_to_limit() {
        let ventures: Vec<_> = (0..150).map(|i| venture(&format!("v{i}"))).collect();
        let records: Vec<_> = (0..150)
            .map(|i| review(&format!("v{i}"), Some(i as f64 / 2.0), SubmissionState::Submitted))
            .collect();

        let ranking = RankingBuilder::default().build(&ventures, &records);
        assert_eq!(ranking.len(), DEFAULT_RANKING_SIZE);
        assert_eq!(ranking[0].entrepreneurship_id.0, "v149");
        assert_eq!(ranking[99].position, 100);
    }

    #[test]
    fn null_policy_changes_the_mean() {
        let ventures = vec![venture("a")];
        let records = vec![
            review("a", Some(90.0), SubmissionState::Submitted),
            review("a", None, SubmissionState::Submitted),
        ];

        let excluded = RankingBuilder::new(10, NullScorePolicy::Exclude).build(&ventures, &records);
        assert_eq!(excluded[0].score, 90.0);

        let coerced =
            RankingBuilder::new(10, NullScorePolicy::CoerceZero).build(&ventures, &records);
        assert_eq!(coerced[0].score, 45.0);
        assert_eq!(coerced[0].evaluations, 2);
    }

    #[test]
    fn only_null_scores_never_rank_when_excluded() {
        let ventures = vec![venture("a")];
        let records = vec![review("a", None, SubmissionState::Submitted)];
        assert!(RankingBuilder::default().build(&ventures, &records).is_empty());
    }
}
