use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::allocation::AllocationError;
use super::domain::{ActorId, Cohort, EntrepreneurshipId, Tier};
use super::eligibility::ViewMode;
use super::repository::{CohortRepository, DecisionNotifier, RepositoryError};
use super::service::{ApprovalRequest, CohortService, CohortServiceError, RejectionRequest};

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Router builder exposing the administrator endpoints for cohort allocation.
pub fn cohort_router<R, N>(service: Arc<CohortService<R, N>>) -> Router
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/cohorts/entrepreneurships",
            get(list_handler::<R, N>),
        )
        .route("/api/v1/cohorts/tiers/:tier", get(tier_handler::<R, N>))
        .route(
            "/api/v1/cohorts/tiers/:tier/approve",
            post(approve_handler::<R, N>),
        )
        .route(
            "/api/v1/cohorts/tiers/:tier/reject",
            post(reject_handler::<R, N>),
        )
        .route(
            "/api/v1/cohorts/tiers/:tier/export.csv",
            get(tier_export_handler::<R, N>),
        )
        .route("/api/v1/cohorts/rankings", get(ranking_handler::<R, N>))
        .route(
            "/api/v1/cohorts/rankings/export.csv",
            get(ranking_export_handler::<R, N>),
        )
        .route(
            "/api/v1/cohorts/export.xlsx",
            get(workbook_handler::<R, N>),
        )
        .route("/api/v1/cohorts/progress", get(progress_handler::<R, N>))
        .with_state(service)
}

/// Raw query parameters; parsed by hand so bad values map to 400 with a useful message.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) view: Option<String>,
    pub(crate) tier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalBody {
    pub(crate) entrepreneurship_id: EntrepreneurshipId,
    #[serde(default)]
    pub(crate) cohort: Option<u8>,
    pub(crate) actor_id: ActorId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionBody {
    pub(crate) entrepreneurship_id: EntrepreneurshipId,
    pub(crate) actor_id: ActorId,
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let mode = match query.view.as_deref().map(str::parse::<ViewMode>) {
        None => ViewMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(error)) => return bad_request(error.to_string()),
    };
    let tier = match query.tier.as_deref().map(str::parse::<Tier>) {
        None => None,
        Some(Ok(tier)) => Some(tier),
        Some(Err(error)) => return bad_request(error.to_string()),
    };

    match service.list(mode, tier) {
        Ok(entries) => {
            let payload = json!({
                "view": mode,
                "tier": tier,
                "entrepreneurships": entries,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn tier_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
    Path(tier): Path<String>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let tier = match tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(error) => return bad_request(error.to_string()),
    };
    match service.tier_overview(tier) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn approve_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
    Path(tier): Path<String>,
    axum::Json(body): axum::Json<ApprovalBody>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let tier = match tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(error) => return bad_request(error.to_string()),
    };
    let cohort = match body.cohort.map(Cohort::try_from).transpose() {
        Ok(cohort) => cohort,
        Err(message) => return bad_request(message),
    };

    let request = ApprovalRequest {
        entrepreneurship_id: body.entrepreneurship_id,
        tier,
        cohort,
        actor_id: body.actor_id,
    };
    match service.approve(request) {
        Ok(assignment) => (StatusCode::OK, axum::Json(assignment)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn reject_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
    Path(tier): Path<String>,
    axum::Json(body): axum::Json<RejectionBody>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let tier = match tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(error) => return bad_request(error.to_string()),
    };
    let request = RejectionRequest {
        entrepreneurship_id: body.entrepreneurship_id,
        tier,
        actor_id: body.actor_id,
    };
    match service.reject(request) {
        Ok(assignment) => (StatusCode::OK, axum::Json(assignment)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn tier_export_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
    Path(tier): Path<String>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let tier = match tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(error) => return bad_request(error.to_string()),
    };
    match service.export_tier_csv(tier) {
        Ok(bytes) => attachment(CSV_CONTENT_TYPE, &format!("{}.csv", tier.label()), bytes),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn ranking_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.ranking() {
        Ok(entries) => {
            let payload = json!({ "entries": entries });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn ranking_export_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.export_ranking_csv() {
        Ok(bytes) => attachment(CSV_CONTENT_TYPE, "ranking.csv", bytes),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn workbook_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.export_workbook() {
        Ok(bytes) => attachment(XLSX_CONTENT_TYPE, "cohorts.xlsx", bytes),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn progress_handler<R, N>(
    State(service): State<Arc<CohortService<R, N>>>,
) -> Response
where
    R: CohortRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.progress() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(other) => error_response(other),
    }
}

fn attachment(content_type: &'static str, filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn error_response(error: CohortServiceError) -> Response {
    let status = match &error {
        CohortServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        CohortServiceError::Ineligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CohortServiceError::Allocation(AllocationError::MissingCohort { .. }) => {
            StatusCode::BAD_REQUEST
        }
        CohortServiceError::Allocation(_) => StatusCode::CONFLICT,
        CohortServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CohortServiceError::Repository(RepositoryError::Constraint(_))
        | CohortServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
