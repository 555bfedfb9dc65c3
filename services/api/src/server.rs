use crate::cli::ServeArgs;
use crate::infra::{build_service, load_repository, AppState};
use crate::routes::with_cohort_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mentorship::config::AppConfig;
use mentorship::error::AppError;
use mentorship::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(seed) = args.seed.take() {
        config.seed_path = Some(seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = load_repository(config.seed_path.as_deref())?;
    let service = build_service(repository, config.program);

    let app = with_cohort_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    let capacity = config.program.capacity;
    info!(
        ?config.environment,
        %addr,
        starter = capacity.starter.total,
        growth = capacity.growth.total,
        scale = capacity.scale.total,
        "mentorship cohort service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
