//! HTTP endpoint implementing the statement submission contract on top of the
//! simulated analysis, so a [`RemoteAnalysisClient`] can target a running
//! service during demos.
//!
//! [`RemoteAnalysisClient`]: super::client::RemoteAnalysisClient

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::warn;

use super::client::{AnalysisClient, SimulatedAnalysisClient};
use super::domain::IdentityInfo;
use super::info::is_valid;
use super::router::{body_limit, error_response, form_error_response, StatementForm};
use super::upload::{UploadPolicy, UploadRejection, UploadStep};

pub const ANALYZE_PATH: &str = "/api/v1/statements/analyze";

#[derive(Debug, Clone)]
pub struct BackendState {
    client: Arc<SimulatedAnalysisClient>,
    upload: UploadStep,
}

pub fn backend_router(client: Arc<SimulatedAnalysisClient>, policy: UploadPolicy) -> Router {
    let state = BackendState {
        client,
        upload: UploadStep::new(policy),
    };

    Router::new()
        .route(ANALYZE_PATH, post(analyze_statement_handler))
        .layer(body_limit(policy))
        .with_state(state)
}

pub(crate) async fn analyze_statement_handler(
    State(state): State<BackendState>,
    multipart: Multipart,
) -> Response {
    let form = match StatementForm::read(multipart).await {
        Ok(form) => form,
        Err(error) => return form_error_response(error),
    };

    let Some(file) = form.file else {
        return error_response(StatusCode::BAD_REQUEST, "missing multipart field 'file'");
    };

    if let Err(rejection) = state.upload.validate(&file) {
        let status = match rejection {
            UploadRejection::NotPdf { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadRejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        };
        return error_response(status, &rejection.to_string());
    }

    let identity = match (form.first_name, form.dob) {
        (None, None) => None,
        (Some(first_name), Some(dob)) if is_valid(&first_name, &dob) => Some(IdentityInfo {
            first_name,
            date_of_birth: dob,
        }),
        _ => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "firstName and a 10 character dob must be sent together",
            )
        }
    };

    match state.client.analyze(&file, identity.as_ref()).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => {
            warn!(%error, "simulated analysis failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
        }
    }
}
