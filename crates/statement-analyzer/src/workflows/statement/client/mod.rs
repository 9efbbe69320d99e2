mod remote;
mod simulated;

use crate::config::{AnalysisBackend, AnalysisConfig};
use crate::workflows::statement::domain::{AnalysisResult, IdentityInfo, UploadedFile};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub use remote::RemoteAnalysisClient;
pub use simulated::{sample_statement, SimulatedAnalysisClient};

/// Boundary to whatever turns a statement file into an [`AnalysisResult`].
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(
        &self,
        file: &UploadedFile,
        info: Option<&IdentityInfo>,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Failure raised by an analysis backend. Never carries a partial result.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analysis backend rejected the statement ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("analysis backend returned a malformed response: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Build the client selected by configuration.
pub fn client_from_config(
    config: &AnalysisConfig,
) -> Result<Arc<dyn AnalysisClient>, AnalysisError> {
    match &config.backend {
        AnalysisBackend::Simulated => {
            info!(
                latency_ms = config.simulated_latency.as_millis() as u64,
                "using simulated statement analysis"
            );
            Ok(Arc::new(SimulatedAnalysisClient::new(
                config.simulated_latency,
            )))
        }
        AnalysisBackend::Remote { endpoint } => {
            info!(%endpoint, "using remote statement analysis backend");
            let client = RemoteAnalysisClient::new(endpoint.clone(), config.request_timeout)?;
            Ok(Arc::new(client))
        }
    }
}
