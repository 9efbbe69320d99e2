//! Statement upload → identity info → analysis result workflow.

pub mod backend;
pub mod client;
pub mod controller;
pub mod domain;
pub mod info;
pub mod notice;
pub mod password;
pub mod result;
pub mod router;
pub mod upload;

#[cfg(test)]
mod tests;

pub use backend::backend_router;
pub use client::{
    client_from_config, sample_statement, AnalysisClient, AnalysisError, RemoteAnalysisClient,
    SimulatedAnalysisClient,
};
pub use controller::{StepAvailability, WorkflowController, WorkflowError, WorkflowSnapshot};
pub use domain::{
    AnalysisResult, FileSummary, IdentityInfo, Transaction, TransactionKind, UploadedFile,
    WorkflowStep, PDF_MIME_TYPE,
};
pub use info::{is_valid, InfoForm};
pub use notice::{Notice, NoticeLevel, NotificationSink};
pub use password::{generate_password, RandomSource, ThreadRandom};
pub use result::{ResultTab, ResultView, SummaryRow};
pub use router::workflow_router;
pub use upload::{UploadPolicy, UploadRejection, UploadStep};
