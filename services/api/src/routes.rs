use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use statement_analyzer::workflows::statement::{
    workflow_router, AnalysisClient, NotificationSink, WorkflowController,
};
use std::sync::Arc;

pub(crate) fn with_workflow_routes<C, N>(controller: Arc<WorkflowController<C, N>>) -> axum::Router
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    workflow_router(controller)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/workflow/notifications",
            axum::routing::get(notifications_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Hands out pending notices once; a second call returns only newer ones.
pub(crate) async fn notifications_endpoint(
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    Json(json!({ "notices": state.notices.drain() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryNoticeBoard;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use statement_analyzer::workflows::statement::{
        Notice, SimulatedAnalysisClient, UploadPolicy,
    };
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<InMemoryNoticeBoard>) {
        let notices = Arc::new(InMemoryNoticeBoard::default());
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            notices: notices.clone(),
        };
        let controller = Arc::new(WorkflowController::with_upload_policy(
            Arc::new(SimulatedAnalysisClient::new(Duration::ZERO)),
            notices.clone(),
            UploadPolicy::capped(UploadPolicy::ADVERTISED_MAX_BYTES),
        ));
        let router = with_workflow_routes(controller).layer(Extension(state));
        (router, notices)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let (router, _) = app(false);
        let response = router.oneshot(get("/ready")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let (router, _) = app(true);
        let response = router.oneshot(get("/ready")).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn workflow_routes_share_the_ops_router() {
        let (router, _) = app(true);

        let health = router.clone().oneshot(get("/health")).await.expect("responds");
        assert_eq!(health.status(), StatusCode::OK);

        let snapshot = router.oneshot(get("/api/v1/workflow")).await.expect("responds");
        assert_eq!(snapshot.status(), StatusCode::OK);
        assert_eq!(body_json(snapshot).await["activeStep"], "upload");
    }

    #[tokio::test]
    async fn notifications_are_drained_once() {
        let (router, notices) = app(true);
        notices.notify(Notice::success("File successfully selected: march.pdf"));

        let first = router
            .clone()
            .oneshot(get("/api/v1/workflow/notifications"))
            .await
            .expect("responds");
        let body = body_json(first).await;
        assert_eq!(body["notices"][0]["level"], "success");
        assert_eq!(
            body["notices"][0]["message"],
            "File successfully selected: march.pdf"
        );

        let second = router
            .oneshot(get("/api/v1/workflow/notifications"))
            .await
            .expect("responds");
        assert_eq!(body_json(second).await["notices"], json!([]));
    }
}
