use serde::Serialize;

use super::domain::{
    ApprovalState, Entrepreneurship, EntrepreneurshipId, EvaluationKind, EvaluationRecord,
    SubmissionState,
};
use super::scoring::{round_to_cents, AggregatedScore, ScoreAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    NotEvaluated,
    AutomaticOnly,
    InReview,
    Reviewed,
}

/// Counts of reviewer evaluations by lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReviewCounts {
    pub total: usize,
    pub drafts: usize,
    pub submitted: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationProgress {
    pub entrepreneurship_id: EntrepreneurshipId,
    pub name: String,
    pub automatic_score: Option<f64>,
    pub reviews: ReviewCounts,
    pub reviewer_average: Option<f64>,
    pub aggregate: AggregatedScore,
    pub stage: ProgressStage,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProgressSummary {
    pub entrepreneurships: usize,
    pub not_evaluated: usize,
    pub automatic_only: usize,
    pub in_review: usize,
    pub reviewed: usize,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub summary: ProgressSummary,
    pub entries: Vec<EvaluationProgress>,
}

pub fn evaluation_progress(
    entrepreneurship: &Entrepreneurship,
    records: &[EvaluationRecord],
    aggregator: &ScoreAggregator,
) -> EvaluationProgress {
    let own: Vec<&EvaluationRecord> = records
        .iter()
        .filter(|record| record.entrepreneurship_id == entrepreneurship.id)
        .collect();

    let automatic_score = own
        .iter()
        .filter(|record| record.kind == EvaluationKind::Automatic)
        .filter_map(|record| record.score)
        .last();

    let mut reviews = ReviewCounts::default();
    let mut approved_scores = Vec::new();
    for record in own.iter().filter(|r| r.kind == EvaluationKind::Reviewer) {
        reviews.total += 1;
        match record.submission {
            SubmissionState::Draft => reviews.drafts += 1,
            SubmissionState::Submitted => {
                reviews.submitted += 1;
                match record.approval {
                    ApprovalState::Pending => reviews.pending += 1,
                    ApprovalState::Approved => {
                        reviews.approved += 1;
                        approved_scores.extend(record.score);
                    }
                    ApprovalState::Rejected => reviews.rejected += 1,
                }
            }
        }
    }

    let reviewer_average = if approved_scores.is_empty() {
        None
    } else {
        let sum: f64 = approved_scores.iter().sum();
        Some(round_to_cents(sum / approved_scores.len() as f64))
    };

    let stage = if own.is_empty() {
        ProgressStage::NotEvaluated
    } else if reviews.total == 0 {
        ProgressStage::AutomaticOnly
    } else if reviews.drafts > 0 || reviews.pending > 0 {
        ProgressStage::InReview
    } else {
        ProgressStage::Reviewed
    };

    EvaluationProgress {
        entrepreneurship_id: entrepreneurship.id.clone(),
        name: entrepreneurship.name.clone(),
        automatic_score,
        reviews,
        reviewer_average,
        aggregate: aggregator.aggregate(records, &entrepreneurship.id),
        stage,
    }
}

pub fn progress_report(
    entrepreneurships: &[Entrepreneurship],
    records: &[EvaluationRecord],
    aggregator: &ScoreAggregator,
) -> ProgressReport {
    let entries: Vec<EvaluationProgress> = entrepreneurships
        .iter()
        .map(|entrepreneurship| evaluation_progress(entrepreneurship, records, aggregator))
        .collect();

    let mut summary = ProgressSummary {
        entrepreneurships: entries.len(),
        ..ProgressSummary::default()
    };
    for entry in &entries {
        match entry.stage {
            ProgressStage::NotEvaluated => summary.not_evaluated += 1,
            ProgressStage::AutomaticOnly => summary.automatic_only += 1,
            ProgressStage::InReview => summary.in_review += 1,
            ProgressStage::Reviewed => summary.reviewed += 1,
        }
    }

    let scored: Vec<f64> = entries.iter().filter_map(|e| e.aggregate.score).collect();
    if !scored.is_empty() {
        summary.mean_score = Some(round_to_cents(
            scored.iter().sum::<f64>() / scored.len() as f64,
        ));
    }

    ProgressReport { summary, entries }
}
