use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNoticeBoard};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use statement_analyzer::config::AppConfig;
use statement_analyzer::error::AppError;
use statement_analyzer::telemetry;
use statement_analyzer::workflows::statement::{
    backend_router, client_from_config, SimulatedAnalysisClient, UploadPolicy, WorkflowController,
};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let notices = Arc::new(InMemoryNoticeBoard::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        notices: notices.clone(),
    };

    let policy = UploadPolicy::capped(config.analysis.max_upload_bytes);
    let controller = Arc::new(WorkflowController::with_upload_policy(
        client_from_config(&config.analysis)?,
        notices,
        policy,
    ));
    let backend = backend_router(
        Arc::new(SimulatedAnalysisClient::new(config.analysis.simulated_latency)),
        policy,
    );

    let app = with_workflow_routes(controller)
        .merge(backend)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "statement analyzer ready");

    axum::serve(listener, app).await?;
    Ok(())
}
