use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::client::AnalysisClient;
use super::controller::{WorkflowController, WorkflowError};
use super::domain::{Transaction, UploadedFile, WorkflowStep};
use super::info::InfoForm;
use super::notice::NotificationSink;
use super::result::{ResultTab, ResultView, SummaryRow};
use super::upload::{UploadPolicy, UploadRejection};

/// Headroom over the file cap for multipart boundaries and text fields.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(default)]
    pub dob: String,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub step: WorkflowStep,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultQuery {
    #[serde(default)]
    pub tab: Option<ResultTab>,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub tab: ResultTab,
    pub summary: Vec<SummaryRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
}

/// Router exposing the single workflow session over HTTP.
pub fn workflow_router<C, N>(controller: Arc<WorkflowController<C, N>>) -> Router
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    let body_limit = body_limit(controller.upload_policy());

    Router::new()
        .route("/api/v1/workflow", get(snapshot_handler::<C, N>))
        .route("/api/v1/workflow/file", post(file_handler::<C, N>))
        .route("/api/v1/workflow/info", post(info_handler::<C, N>))
        .route("/api/v1/workflow/analyze", post(analyze_handler::<C, N>))
        .route("/api/v1/workflow/step", post(step_handler::<C, N>))
        .route("/api/v1/workflow/reset", post(reset_handler::<C, N>))
        .route("/api/v1/workflow/result", get(result_handler::<C, N>))
        .layer(body_limit)
        .with_state(controller)
}

pub(crate) fn body_limit(policy: UploadPolicy) -> DefaultBodyLimit {
    match policy.max_bytes {
        Some(max_bytes) => DefaultBodyLimit::max(
            usize::try_from(max_bytes)
                .unwrap_or(usize::MAX)
                .saturating_add(MULTIPART_OVERHEAD_BYTES),
        ),
        None => DefaultBodyLimit::disable(),
    }
}

pub(crate) async fn snapshot_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    (StatusCode::OK, Json(controller.snapshot())).into_response()
}

pub(crate) async fn file_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
    multipart: Multipart,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    let form = match StatementForm::read(multipart).await {
        Ok(form) => form,
        Err(error) => return form_error_response(error),
    };
    let Some(file) = form.file else {
        return error_response(StatusCode::BAD_REQUEST, "missing multipart field 'file'");
    };

    match controller.submit_file(file) {
        Ok(_) => (StatusCode::OK, Json(controller.snapshot())).into_response(),
        Err(error) => workflow_error_response(error),
    }
}

pub(crate) async fn info_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
    Json(request): Json<InfoRequest>,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    let form = InfoForm::new(request.first_name, request.dob);
    match controller.submit_info(&form) {
        Ok(_) => (StatusCode::OK, Json(controller.snapshot())).into_response(),
        Err(error) => workflow_error_response(error),
    }
}

pub(crate) async fn analyze_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    // Spawned so a dropped request detaches the analysis instead of cancelling it.
    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.analyze().await }
    });

    match task.await {
        Ok(Ok(_)) => (StatusCode::OK, Json(controller.snapshot())).into_response(),
        Ok(Err(error)) => workflow_error_response(error),
        Err(error) => {
            warn!(%error, "analysis task did not complete");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "analysis task did not complete")
        }
    }
}

pub(crate) async fn step_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
    Json(request): Json<StepRequest>,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    match controller.select_step(request.step) {
        Ok(_) => (StatusCode::OK, Json(controller.snapshot())).into_response(),
        Err(error) => workflow_error_response(error),
    }
}

pub(crate) async fn reset_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    (StatusCode::OK, Json(controller.reset())).into_response()
}

pub(crate) async fn result_handler<C, N>(
    State(controller): State<Arc<WorkflowController<C, N>>>,
    Query(query): Query<ResultQuery>,
) -> Response
where
    C: AnalysisClient + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    let Some(result) = controller.snapshot().result else {
        return error_response(StatusCode::NOT_FOUND, "no analysis result yet");
    };

    let mut view = ResultView::new(result);
    view.select_tab(query.tab.unwrap_or_default());
    let transactions = match view.tab() {
        ResultTab::Transactions => Some(view.transactions().to_vec()),
        ResultTab::Summary => None,
    };

    let body = ResultResponse {
        tab: view.tab(),
        summary: view.summary(),
        transactions,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub(crate) fn workflow_error_response(error: WorkflowError) -> Response {
    let status = match &error {
        WorkflowError::Upload(UploadRejection::NotPdf { .. }) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        WorkflowError::Upload(UploadRejection::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        WorkflowError::InvalidInfo => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::MissingFile => StatusCode::BAD_REQUEST,
        WorkflowError::InFlight
        | WorkflowError::StepUnavailable(_)
        | WorkflowError::Superseded => StatusCode::CONFLICT,
        WorkflowError::Analysis(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, &error.to_string())
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Fields of a statement submission (`file`, `firstName`, `dob`).
#[derive(Debug, Default)]
pub(crate) struct StatementForm {
    pub(crate) file: Option<UploadedFile>,
    pub(crate) first_name: Option<String>,
    pub(crate) dob: Option<String>,
}

impl StatementForm {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "file" => {
                    let name = field.file_name().unwrap_or("statement").to_string();
                    let mime_type = field.content_type().unwrap_or_default().to_string();
                    let content = field.bytes().await?;
                    form.file = Some(UploadedFile::new(name, mime_type, content.to_vec()));
                }
                "firstName" => form.first_name = Some(field.text().await?),
                "dob" => form.dob = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }
}

pub(crate) fn form_error_response(error: MultipartError) -> Response {
    let status = error.status();
    error_response(status, &error.body_text())
}
