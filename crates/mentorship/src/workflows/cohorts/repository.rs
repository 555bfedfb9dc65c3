use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::allocation::AllocationError;
use super::domain::{
    Entrepreneurship, EntrepreneurshipId, EvaluationRecord, QuotaAssignment, Tier,
};

/// Capacity check evaluated by the store against every current assignment row.
pub type CommitGuard<'a> = dyn Fn(&[QuotaAssignment]) -> Result<(), AllocationError> + 'a;

/// Storage abstraction over the program's entity, evaluation, and assignment tables.
///
/// Implementations must make [`CohortRepository::commit_guarded`] atomic: the guard
/// observes the assignment rows and the write lands without any other writer in between.
pub trait CohortRepository: Send + Sync {
    /// Entrepreneurships, optionally restricted to an explicit tier.
    fn entrepreneurships(&self, tier: Option<Tier>)
        -> Result<Vec<Entrepreneurship>, RepositoryError>;
    fn entrepreneurship(
        &self,
        id: &EntrepreneurshipId,
    ) -> Result<Option<Entrepreneurship>, RepositoryError>;
    /// Evaluation records whose entrepreneurship is one of `ids`.
    fn evaluations(
        &self,
        ids: &[EntrepreneurshipId],
    ) -> Result<Vec<EvaluationRecord>, RepositoryError>;
    fn assignments(&self, tier: Option<Tier>) -> Result<Vec<QuotaAssignment>, RepositoryError>;
    /// Unconditional upsert keyed by (entrepreneurship, tier).
    fn upsert_assignment(
        &self,
        assignment: QuotaAssignment,
    ) -> Result<QuotaAssignment, RepositoryError>;
    /// Upsert that only happens when `guard` accepts the current assignment rows.
    fn commit_guarded(
        &self,
        assignment: QuotaAssignment,
        guard: &CommitGuard<'_>,
    ) -> Result<QuotaAssignment, CommitError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a guarded commit.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    Refused(#[from] AllocationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outbound hook for decision notifications (e-mail or webhook adapters).
pub trait DecisionNotifier: Send + Sync {
    fn notify(&self, notice: DecisionNotice) -> Result<(), NotifyError>;
}

/// Payload handed to the notification adapter after a decision is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub template: String,
    pub entrepreneurship_id: EntrepreneurshipId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
