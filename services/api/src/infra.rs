use mentorship::error::AppError;
use mentorship::workflows::cohorts::{
    CohortService, DecisionNotice, DecisionNotifier, InMemoryCohortRepository, NotifyError,
    ProgramSettings, ProgramSnapshot,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notifier for deployments without a mail relay: every notice becomes a log line.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingNotifier;

impl DecisionNotifier for LoggingNotifier {
    fn notify(&self, notice: DecisionNotice) -> Result<(), NotifyError> {
        info!(
            template = %notice.template,
            entrepreneurship = %notice.entrepreneurship_id,
            details = ?notice.details,
            "decision notice"
        );
        Ok(())
    }
}

pub(crate) type ProgramService = CohortService<InMemoryCohortRepository, LoggingNotifier>;

/// Store hydrated from a JSON snapshot, or empty when no seed is configured.
pub(crate) fn load_repository(seed: Option<&Path>) -> Result<InMemoryCohortRepository, AppError> {
    let Some(path) = seed else {
        return Ok(InMemoryCohortRepository::default());
    };
    let snapshot = ProgramSnapshot::from_path(path)?;
    info!(
        path = %path.display(),
        entrepreneurships = snapshot.entrepreneurships.len(),
        evaluations = snapshot.evaluations.len(),
        assignments = snapshot.assignments.len(),
        "program snapshot loaded"
    );
    Ok(InMemoryCohortRepository::from_snapshot(snapshot))
}

pub(crate) fn build_service(
    repository: InMemoryCohortRepository,
    settings: ProgramSettings,
) -> Arc<ProgramService> {
    Arc::new(CohortService::new(
        Arc::new(repository),
        Arc::new(LoggingNotifier),
        settings,
    ))
}
