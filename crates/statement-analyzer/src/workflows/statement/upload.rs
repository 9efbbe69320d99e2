use super::domain::UploadedFile;
use super::notice::{Notice, NotificationSink};
use tracing::{debug, warn};

/// Size cap applied on top of the media type check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: Option<u64>,
}

impl UploadPolicy {
    pub const ADVERTISED_MAX_BYTES: u64 = 10 * 1024 * 1024;

    pub const fn uncapped() -> Self {
        Self { max_bytes: None }
    }

    pub const fn capped(max_bytes: u64) -> Self {
        Self {
            max_bytes: Some(max_bytes),
        }
    }
}

/// Reason a candidate file was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("Please upload a PDF file only")]
    NotPdf { mime_type: String },
    #[error("File exceeds the {} MB limit", .limit_bytes / (1024 * 1024))]
    TooLarge { size_bytes: u64, limit_bytes: u64 },
}

/// Entry point shared by every way a file can be offered.
#[derive(Debug, Clone, Default)]
pub struct UploadStep {
    policy: UploadPolicy,
}

impl UploadStep {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    /// Validate a candidate and hand it back for the caller to store.
    pub fn submit_file<N>(
        &self,
        candidate: UploadedFile,
        notices: &N,
    ) -> Result<UploadedFile, UploadRejection>
    where
        N: NotificationSink + ?Sized,
    {
        match self.validate(&candidate) {
            Ok(()) => {
                debug!(size_bytes = candidate.size_bytes(), "statement file accepted");
                notices.notify(Notice::success(format!(
                    "File successfully selected: {}",
                    candidate.name
                )));
                Ok(candidate)
            }
            Err(rejection) => {
                warn!(reason = %rejection, "statement file rejected");
                notices.notify(Notice::error(rejection.to_string()));
                Err(rejection)
            }
        }
    }

    /// Type and size checks without any notification side effects.
    pub fn validate(&self, candidate: &UploadedFile) -> Result<(), UploadRejection> {
        if !candidate.is_pdf() {
            return Err(UploadRejection::NotPdf {
                mime_type: candidate.mime_type.clone(),
            });
        }

        if let Some(limit_bytes) = self.policy.max_bytes {
            let size_bytes = candidate.size_bytes();
            if size_bytes > limit_bytes {
                return Err(UploadRejection::TooLarge {
                    size_bytes,
                    limit_bytes,
                });
            }
        }

        Ok(())
    }
}
