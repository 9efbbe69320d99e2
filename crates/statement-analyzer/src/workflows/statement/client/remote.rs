use super::{AnalysisClient, AnalysisError};
use crate::workflows::statement::domain::{AnalysisResult, IdentityInfo, UploadedFile};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, warn};

/// Submits the statement as `multipart/form-data` to an analysis backend.
#[derive(Debug, Clone)]
pub struct RemoteAnalysisClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteAnalysisClient {
    /// `timeout` of `None` lets a request run to completion.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, AnalysisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(file: &UploadedFile, info: Option<&IdentityInfo>) -> Result<Form, AnalysisError> {
        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;

        let mut form = Form::new().part("file", part);
        if let Some(info) = info {
            form = form
                .text("firstName", info.first_name.clone())
                .text("dob", info.date_of_birth.clone());
        }

        Ok(form)
    }
}

#[async_trait]
impl AnalysisClient for RemoteAnalysisClient {
    async fn analyze(
        &self,
        file: &UploadedFile,
        info: Option<&IdentityInfo>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let form = Self::form(file, info)?;
        debug!(endpoint = %self.endpoint, size_bytes = file.size_bytes(), "submitting statement");

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = rejection_message(&body);
            warn!(status = status.as_u16(), %message, "analysis backend rejected statement");
            return Err(AnalysisError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(AnalysisError::Malformed)
    }
}

// Backends answer errors as `{"error": "..."}`; anything else is passed through.
fn rejection_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_prefers_error_field() {
        assert_eq!(
            rejection_message(br#"{"error":"Please upload a PDF file only"}"#),
            "Please upload a PDF file only"
        );
        assert_eq!(rejection_message(b" gateway timeout \n"), "gateway timeout");
        assert_eq!(rejection_message(br#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    }
}
