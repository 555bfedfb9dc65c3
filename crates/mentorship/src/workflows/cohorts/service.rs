use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::allocation::{AllocationError, QuotaAllocator, Rejection, TierUsage};
use super::domain::{
    ActorId, Cohort, Entrepreneurship, EntrepreneurshipId, EvaluationRecord, QuotaAssignment,
    Tier,
};
use super::eligibility::{scope_entrepreneurships, ScopedEntrepreneurship, ViewMode};
use super::export::{self, ExportError};
use super::progress::{progress_report, ProgressReport};
use super::ranking::{RankingBuilder, RankingEntry};
use super::repository::{
    CohortRepository, CommitError, DecisionNotice, DecisionNotifier, RepositoryError,
};
use super::scoring::{AggregatedScore, ScoreAggregator};
use super::settings::ProgramSettings;

/// Request to seat an entrepreneurship in a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub entrepreneurship_id: EntrepreneurshipId,
    pub tier: Tier,
    #[serde(default)]
    pub cohort: Option<Cohort>,
    pub actor_id: ActorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionRequest {
    pub entrepreneurship_id: EntrepreneurshipId,
    pub tier: Tier,
    pub actor_id: ActorId,
}

/// One row of a tier tab: an eligible entrepreneurship and its current decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCandidate {
    pub entrepreneurship: Entrepreneurship,
    pub aggregate: AggregatedScore,
    pub decision: Option<QuotaAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierOverview {
    pub usage: TierUsage,
    pub candidates: Vec<TierCandidate>,
}

/// Snapshot of the three tables, fetched once per request.
struct ProgramView {
    entrepreneurships: Vec<Entrepreneurship>,
    evaluations: Vec<EvaluationRecord>,
    assignments: Vec<QuotaAssignment>,
}

/// Service composing the repository, notifier, and program rules.
pub struct CohortService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    allocator: QuotaAllocator,
    aggregator: ScoreAggregator,
    ranking: RankingBuilder,
}

impl<R, N> CohortService<R, N>
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, settings: ProgramSettings) -> Self {
        Self {
            repository,
            notifier,
            allocator: QuotaAllocator::new(settings.capacity),
            aggregator: ScoreAggregator::strict(),
            ranking: RankingBuilder::new(settings.ranking_size, settings.ranking_null_scores),
        }
    }

    pub fn allocator(&self) -> &QuotaAllocator {
        &self.allocator
    }

    fn load(&self) -> Result<ProgramView, RepositoryError> {
        let entrepreneurships = self.repository.entrepreneurships(None)?;
        let ids: Vec<EntrepreneurshipId> = entrepreneurships
            .iter()
            .map(|entrepreneurship| entrepreneurship.id.clone())
            .collect();
        let evaluations = self.repository.evaluations(&ids)?;
        let assignments = self.repository.assignments(None)?;
        Ok(ProgramView {
            entrepreneurships,
            evaluations,
            assignments,
        })
    }

    /// Entrepreneurships in scope for a view, annotated with their effective tier.
    pub fn list(
        &self,
        mode: ViewMode,
        tier: Option<Tier>,
    ) -> Result<Vec<ScopedEntrepreneurship>, CohortServiceError> {
        let view = self.load()?;
        let scores = self.aggregator.aggregate_all(&view.evaluations);
        Ok(scope_entrepreneurships(
            mode,
            tier,
            &view.entrepreneurships,
            &scores,
            &view.assignments,
        ))
    }

    /// Seat usage plus every eligible entrepreneurship belonging to `tier`, best score first.
    pub fn tier_overview(&self, tier: Tier) -> Result<TierOverview, CohortServiceError> {
        let view = self.load()?;
        Ok(self.overview_from(&view, tier))
    }

    fn overview_from(&self, view: &ProgramView, tier: Tier) -> TierOverview {
        let scores = self.aggregator.aggregate_all(&view.evaluations);
        let scoped = scope_entrepreneurships(
            ViewMode::All,
            Some(tier),
            &view.entrepreneurships,
            &scores,
            &view.assignments,
        );

        let mut candidates: Vec<TierCandidate> = scoped
            .into_iter()
            .filter(|entry| entry.aggregate.is_evaluated())
            .map(|entry| {
                let decision = view
                    .assignments
                    .iter()
                    .find(|row| row.key() == (&entry.entrepreneurship.id, tier))
                    .cloned();
                TierCandidate {
                    entrepreneurship: entry.entrepreneurship,
                    aggregate: entry.aggregate,
                    decision,
                }
            })
            .collect();
        candidates.sort_by(|left, right| {
            let left = left.aggregate.score.unwrap_or(f64::NEG_INFINITY);
            let right = right.aggregate.score.unwrap_or(f64::NEG_INFINITY);
            right.total_cmp(&left)
        });

        TierOverview {
            usage: self.allocator.usage(tier, &view.assignments),
            candidates,
        }
    }

    fn eligible(&self, id: &EntrepreneurshipId) -> Result<Entrepreneurship, CohortServiceError> {
        let entrepreneurship = self
            .repository
            .entrepreneurship(id)?
            .ok_or_else(|| CohortServiceError::NotFound(id.clone()))?;

        let records = self.repository.evaluations(std::slice::from_ref(id))?;
        if !self.aggregator.aggregate(&records, id).is_evaluated() {
            return Err(CohortServiceError::Ineligible(id.clone()));
        }
        Ok(entrepreneurship)
    }

    /// Approve an entrepreneurship into a tier, enforcing tier and cohort ceilings.
    pub fn approve(
        &self,
        request: ApprovalRequest,
    ) -> Result<QuotaAssignment, CohortServiceError> {
        let ApprovalRequest {
            entrepreneurship_id,
            tier,
            cohort,
            actor_id,
        } = request;

        let entrepreneurship = self.eligible(&entrepreneurship_id)?;
        let candidate = self.allocator.approval(
            &entrepreneurship_id,
            tier,
            cohort,
            &actor_id,
            Utc::now(),
        )?;

        let allocator = self.allocator;
        let probe = candidate.clone();
        let stored = self
            .repository
            .commit_guarded(candidate, &|current: &[QuotaAssignment]| {
                allocator.check_approval(&probe, current)
            })
            .map_err(|err| {
                if let CommitError::Refused(reason) = &err {
                    warn!(
                        entrepreneurship = %entrepreneurship_id,
                        %tier,
                        %reason,
                        "approval refused"
                    );
                }
                CohortServiceError::from(err)
            })?;

        info!(
            entrepreneurship = %stored.entrepreneurship_id,
            tier = %stored.tier,
            cohort = ?stored.cohort.map(u8::from),
            actor = %stored.decided_by.0,
            "entrepreneurship approved"
        );
        self.publish("quota_approved", &entrepreneurship, &stored);
        Ok(stored)
    }

    /// Record a rejection; rejecting an already rejected pair changes nothing.
    pub fn reject(
        &self,
        request: RejectionRequest,
    ) -> Result<QuotaAssignment, CohortServiceError> {
        let RejectionRequest {
            entrepreneurship_id,
            tier,
            actor_id,
        } = request;

        let entrepreneurship = self.eligible(&entrepreneurship_id)?;
        let existing = self
            .repository
            .assignments(Some(tier))?
            .into_iter()
            .find(|row| row.entrepreneurship_id == entrepreneurship_id);

        match self.allocator.rejection(
            existing.as_ref(),
            &entrepreneurship_id,
            tier,
            &actor_id,
            Utc::now(),
        ) {
            Rejection::Unchanged(row) => Ok(row),
            Rejection::Record(row) => {
                let stored = self.repository.upsert_assignment(row)?;
                info!(
                    entrepreneurship = %stored.entrepreneurship_id,
                    tier = %stored.tier,
                    actor = %stored.decided_by.0,
                    "entrepreneurship rejected"
                );
                self.publish("quota_rejected", &entrepreneurship, &stored);
                Ok(stored)
            }
        }
    }

    fn publish(
        &self,
        template: &str,
        entrepreneurship: &Entrepreneurship,
        decision: &QuotaAssignment,
    ) {
        let mut details = BTreeMap::new();
        details.insert("entrepreneurship".to_string(), entrepreneurship.name.clone());
        details.insert("owner_id".to_string(), entrepreneurship.owner_id.0.clone());
        details.insert("tier".to_string(), decision.tier.label().to_string());
        details.insert("decision".to_string(), decision.state.label().to_string());
        if let Some(cohort) = decision.cohort {
            details.insert("cohort".to_string(), cohort.to_string());
        }

        let notice = DecisionNotice {
            template: template.to_string(),
            entrepreneurship_id: decision.entrepreneurship_id.clone(),
            details,
        };
        if let Err(err) = self.notifier.notify(notice) {
            warn!(
                entrepreneurship = %decision.entrepreneurship_id,
                error = %err,
                "decision notification failed"
            );
        }
    }

    /// Top entrepreneurships by aggregated score.
    pub fn ranking(&self) -> Result<Vec<RankingEntry>, CohortServiceError> {
        let view = self.load()?;
        Ok(self.ranking.build(&view.entrepreneurships, &view.evaluations))
    }

    pub fn progress(&self) -> Result<ProgressReport, CohortServiceError> {
        let view = self.load()?;
        Ok(progress_report(
            &view.entrepreneurships,
            &view.evaluations,
            &self.aggregator,
        ))
    }

    pub fn export_tier_csv(&self, tier: Tier) -> Result<Vec<u8>, CohortServiceError> {
        let overview = self.tier_overview(tier)?;
        let mut buffer = Vec::new();
        export::write_tier_csv(&overview, &mut buffer)?;
        Ok(buffer)
    }

    pub fn export_ranking_csv(&self) -> Result<Vec<u8>, CohortServiceError> {
        let ranking = self.ranking()?;
        let mut buffer = Vec::new();
        export::write_ranking_csv(&ranking, &mut buffer)?;
        Ok(buffer)
    }

    /// Spreadsheet with one sheet per tier and the ranking, from a single snapshot.
    pub fn export_workbook(&self) -> Result<Vec<u8>, CohortServiceError> {
        let view = self.load()?;
        let overviews: Vec<TierOverview> = Tier::ALL
            .iter()
            .map(|&tier| self.overview_from(&view, tier))
            .collect();
        let ranking = self.ranking.build(&view.entrepreneurships, &view.evaluations);
        Ok(export::workbook(&overviews, &ranking)?)
    }
}

/// Error raised by the cohort service.
#[derive(Debug, thiserror::Error)]
pub enum CohortServiceError {
    #[error("entrepreneurship {0} not found")]
    NotFound(EntrepreneurshipId),
    #[error("entrepreneurship {0} has no qualifying evaluations")]
    Ineligible(EntrepreneurshipId),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<CommitError> for CohortServiceError {
    fn from(value: CommitError) -> Self {
        match value {
            CommitError::Refused(reason) => Self::Allocation(reason),
            CommitError::Repository(err) => Self::Repository(err),
        }
    }
}
