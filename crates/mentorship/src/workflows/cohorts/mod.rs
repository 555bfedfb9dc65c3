//! Tier quotas, cohort seats, and rankings for the mentorship program.
//!
//! Scores are aggregated from evaluation records, mapped to a tier, and used to
//! decide who an administrator may seat in each tier and cohort. Every request
//! recomputes from the repository; nothing is cached between calls.

pub mod allocation;
pub mod domain;
pub mod eligibility;
pub mod export;
pub mod memory;
pub mod progress;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod seed;
pub mod service;
pub mod settings;

#[cfg(test)]
mod tests;

pub use allocation::{
    AllocationError, CapacityConfig, CohortUsage, QuotaAllocator, Rejection, TierCapacity,
    TierUsage,
};
pub use domain::{
    ActorId, ApprovalState, Cohort, DecisionState, Entrepreneurship, EntrepreneurshipId,
    EvaluationKind, EvaluationRecord, QuotaAssignment, SubmissionState, Tier, UnknownVariant,
};
pub use eligibility::{scope_entrepreneurships, ScopedEntrepreneurship, ViewMode};
pub use export::ExportError;
pub use memory::InMemoryCohortRepository;
pub use progress::{EvaluationProgress, ProgressReport, ProgressStage, ProgressSummary};
pub use ranking::{RankingBuilder, RankingEntry, DEFAULT_RANKING_SIZE};
pub use repository::{
    CohortRepository, CommitError, DecisionNotice, DecisionNotifier, NotifyError,
    RepositoryError,
};
pub use router::cohort_router;
pub use scoring::{
    classify, AggregatedScore, NullScorePolicy, QualificationRule, ScoreAggregator,
};
pub use seed::{ProgramSnapshot, SeedError};
pub use service::{
    ApprovalRequest, CohortService, CohortServiceError, RejectionRequest, TierCandidate,
    TierOverview,
};
pub use settings::ProgramSettings;
