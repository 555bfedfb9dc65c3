use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::cohorts::domain::{
    ActorId, ApprovalState, Cohort, Entrepreneurship, EntrepreneurshipId, EvaluationKind,
    EvaluationRecord, QuotaAssignment, SubmissionState, Tier,
};
use crate::workflows::cohorts::memory::InMemoryCohortRepository;
use crate::workflows::cohorts::repository::{
    CohortRepository, CommitError, CommitGuard, DecisionNotice, DecisionNotifier, NotifyError,
    RepositoryError,
};
use crate::workflows::cohorts::router::cohort_router;
use crate::workflows::cohorts::seed::ProgramSnapshot;
use crate::workflows::cohorts::service::{ApprovalRequest, CohortService, RejectionRequest};
use crate::workflows::cohorts::settings::ProgramSettings;
use crate::workflows::cohorts::{CapacityConfig, TierCapacity};

pub(super) fn id(value: &str) -> EntrepreneurshipId {
    EntrepreneurshipId(value.to_string())
}

pub(super) fn admin() -> ActorId {
    ActorId("admin-1".to_string())
}

pub(super) fn venture(value: &str) -> Entrepreneurship {
    Entrepreneurship {
        id: id(value),
        name: format!("Venture {value}"),
        owner_id: ActorId(format!("user-{value}")),
        owner_name: format!("Owner {value}"),
        tier: None,
    }
}

pub(super) fn automatic(value: &str, score: f64) -> EvaluationRecord {
    EvaluationRecord {
        entrepreneurship_id: id(value),
        score: Some(score),
        kind: EvaluationKind::Automatic,
        submission: SubmissionState::Submitted,
        approval: ApprovalState::Pending,
        reviewer_id: None,
    }
}

pub(super) fn review(value: &str, score: Option<f64>, approval: ApprovalState) -> EvaluationRecord {
    EvaluationRecord {
        entrepreneurship_id: id(value),
        score,
        kind: EvaluationKind::Reviewer,
        submission: SubmissionState::Submitted,
        approval,
        reviewer_id: Some(ActorId("reviewer-1".to_string())),
    }
}

/// One venture per `(id, score)` pair, each with a single automatic evaluation.
pub(super) fn scored_program(entries: &[(&str, f64)]) -> ProgramSnapshot {
    ProgramSnapshot {
        entrepreneurships: entries.iter().map(|(value, _)| venture(value)).collect(),
        evaluations: entries
            .iter()
            .map(|(value, score)| automatic(value, *score))
            .collect(),
        assignments: Vec::new(),
    }
}

/// `count` ventures named `{prefix}-{n}` scoring 75.
pub(super) fn numbered_program(prefix: &str, count: usize) -> ProgramSnapshot {
    let names: Vec<String> = (0..count).map(|n| format!("{prefix}-{n}")).collect();
    let entries: Vec<(&str, f64)> = names.iter().map(|name| (name.as_str(), 75.0)).collect();
    scored_program(&entries)
}

/// Capacity small enough to fill in a test.
pub(super) fn small_capacity() -> CapacityConfig {
    CapacityConfig::default()
        .with_tier(
            Tier::Starter,
            TierCapacity {
                total: 4,
                per_cohort: Some(2),
            },
        )
        .with_tier(
            Tier::Scale,
            TierCapacity {
                total: 3,
                per_cohort: None,
            },
        )
}

pub(super) fn approve_request(
    value: &str,
    tier: Tier,
    cohort: Option<Cohort>,
) -> ApprovalRequest {
    ApprovalRequest {
        entrepreneurship_id: id(value),
        tier,
        cohort,
        actor_id: admin(),
    }
}

pub(super) fn reject_request(value: &str, tier: Tier) -> RejectionRequest {
    RejectionRequest {
        entrepreneurship_id: id(value),
        tier,
        actor_id: admin(),
    }
}

pub(super) type MemoryService = CohortService<InMemoryCohortRepository, MemoryNotifier>;

pub(super) fn build_service(
    snapshot: ProgramSnapshot,
    settings: ProgramSettings,
) -> (
    MemoryService,
    Arc<InMemoryCohortRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(InMemoryCohortRepository::from_snapshot(snapshot));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = CohortService::new(repository.clone(), notifier.clone(), settings);
    (service, repository, notifier)
}

pub(super) fn router_for(snapshot: ProgramSnapshot, settings: ProgramSettings) -> axum::Router {
    let (service, _, _) = build_service(snapshot, settings);
    cohort_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<DecisionNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

impl DecisionNotifier for MemoryNotifier {
    fn notify(&self, notice: DecisionNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl DecisionNotifier for FailingNotifier {
    fn notify(&self, _notice: DecisionNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl CohortRepository for UnavailableRepository {
    fn entrepreneurships(
        &self,
        _tier: Option<Tier>,
    ) -> Result<Vec<Entrepreneurship>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn entrepreneurship(
        &self,
        _id: &EntrepreneurshipId,
    ) -> Result<Option<Entrepreneurship>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn evaluations(
        &self,
        _ids: &[EntrepreneurshipId],
    ) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn assignments(&self, _tier: Option<Tier>) -> Result<Vec<QuotaAssignment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn upsert_assignment(
        &self,
        _assignment: QuotaAssignment,
    ) -> Result<QuotaAssignment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_guarded(
        &self,
        _assignment: QuotaAssignment,
        _guard: &CommitGuard<'_>,
    ) -> Result<QuotaAssignment, CommitError> {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
