use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::client::{AnalysisClient, AnalysisError};
use super::domain::{AnalysisResult, FileSummary, IdentityInfo, UploadedFile, WorkflowStep};
use super::info::InfoForm;
use super::notice::{Notice, NotificationSink};
use super::upload::{UploadPolicy, UploadRejection, UploadStep};

pub const ANALYSIS_SUCCEEDED: &str = "Statement successfully analyzed";
pub const ANALYSIS_FAILED: &str = "Error analyzing statement. Please try again.";

#[derive(Debug, Default)]
struct WorkflowState {
    selected_file: Option<UploadedFile>,
    identity_info: Option<IdentityInfo>,
    result: Option<AnalysisResult>,
    in_flight: bool,
    active_step: WorkflowStep,
    // Bumped by reset so a late analysis completion can tell it was superseded.
    epoch: u64,
}

impl WorkflowState {
    fn step_enabled(&self, step: WorkflowStep) -> bool {
        if self.in_flight {
            return false;
        }
        match step {
            WorkflowStep::Upload => true,
            WorkflowStep::Info => self.selected_file.is_some(),
            WorkflowStep::Result => self.result.is_some(),
        }
    }

    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            active_step: self.active_step,
            in_flight: self.in_flight,
            analyze_enabled: !self.in_flight,
            selected_file: self.selected_file.as_ref().map(UploadedFile::summary),
            identity_info: self.identity_info.clone(),
            result: self.result.clone(),
            steps: WorkflowStep::ordered()
                .into_iter()
                .map(|step| StepAvailability {
                    step,
                    label: step.label(),
                    enabled: self.step_enabled(step),
                })
                .collect(),
        }
    }
}

/// Read-only copy of the workflow state handed to views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub active_step: WorkflowStep,
    pub in_flight: bool,
    pub analyze_enabled: bool,
    pub selected_file: Option<FileSummary>,
    pub identity_info: Option<IdentityInfo>,
    pub result: Option<AnalysisResult>,
    pub steps: Vec<StepAvailability>,
}

impl WorkflowSnapshot {
    pub fn can_enter(&self, step: WorkflowStep) -> bool {
        self.steps
            .iter()
            .any(|entry| entry.step == step && entry.enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepAvailability {
    pub step: WorkflowStep,
    pub label: &'static str,
    pub enabled: bool,
}

/// Error raised by a workflow transition.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Upload(#[from] UploadRejection),
    #[error("first name and a 10 character date of birth are required")]
    InvalidInfo,
    #[error("Please upload a PDF file first")]
    MissingFile,
    #[error("an analysis is already in progress")]
    InFlight,
    #[error("the {0} step is not available yet")]
    StepUnavailable(WorkflowStep),
    #[error("Error analyzing statement. Please try again.")]
    Analysis(#[source] AnalysisError),
    #[error("the workflow was reset before the analysis finished")]
    Superseded,
}

/// Owns the upload → info → result workflow and is the only caller of the
/// analysis client. Every mutation goes through one of the transition methods.
pub struct WorkflowController<C: ?Sized, N: ?Sized> {
    state: Mutex<WorkflowState>,
    upload: UploadStep,
    client: Arc<C>,
    notices: Arc<N>,
}

impl<C, N> WorkflowController<C, N>
where
    C: AnalysisClient + ?Sized,
    N: NotificationSink + ?Sized,
{
    pub fn new(client: Arc<C>, notices: Arc<N>) -> Self {
        Self::with_upload_policy(client, notices, UploadPolicy::uncapped())
    }

    pub fn with_upload_policy(client: Arc<C>, notices: Arc<N>, policy: UploadPolicy) -> Self {
        Self {
            state: Mutex::new(WorkflowState::default()),
            upload: UploadStep::new(policy),
            client,
            notices,
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        self.upload.policy()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.lock().snapshot()
    }

    /// Run the upload step and store the accepted file.
    pub fn submit_file(&self, candidate: UploadedFile) -> Result<FileSummary, WorkflowError> {
        let file = self.upload.submit_file(candidate, self.notices.as_ref())?;
        let summary = file.summary();

        let mut state = self.lock();
        state.selected_file = Some(file);
        if state.active_step == WorkflowStep::Upload {
            state.active_step = WorkflowStep::Info;
        }
        info!(step = ?state.active_step, size_bytes = summary.size_bytes, "statement file stored");

        Ok(summary)
    }

    /// Store the identity info from a valid form. Leaves the step unchanged.
    pub fn submit_info(&self, form: &InfoForm) -> Result<IdentityInfo, WorkflowError> {
        let info = form.submit().ok_or(WorkflowError::InvalidInfo)?;
        self.lock().identity_info = Some(info.clone());
        debug!("identity info stored");
        Ok(info)
    }

    /// Analyze the selected file. `in_flight` stays set for the whole client
    /// call, including when this future is dropped before it resolves.
    pub async fn analyze(&self) -> Result<AnalysisResult, WorkflowError> {
        let (file, identity, epoch, in_flight) = {
            let mut state = self.lock();
            let Some(file) = state.selected_file.clone() else {
                drop(state);
                warn!("analysis requested without a statement file");
                self.notices
                    .notify(Notice::error(WorkflowError::MissingFile.to_string()));
                return Err(WorkflowError::MissingFile);
            };
            if state.in_flight {
                return Err(WorkflowError::InFlight);
            }
            state.in_flight = true;
            let identity = state.identity_info.clone();
            (
                file,
                identity,
                state.epoch,
                InFlightGuard::arm(&self.state),
            )
        };

        info!(with_identity = identity.is_some(), "statement analysis started");
        let outcome = self.client.analyze(&file, identity.as_ref()).await;

        let stored = {
            let mut state = in_flight.finish();
            match outcome {
                Ok(result) if state.epoch == epoch => {
                    state.result = Some(result.clone());
                    state.active_step = WorkflowStep::Result;
                    Ok(result)
                }
                Ok(_) => Err(WorkflowError::Superseded),
                Err(err) => Err(WorkflowError::Analysis(err)),
            }
        };

        match &stored {
            Ok(_) => {
                info!("statement analysis completed");
                self.notices.notify(Notice::success(ANALYSIS_SUCCEEDED));
            }
            Err(WorkflowError::Analysis(err)) => {
                warn!(error = %err, "statement analysis failed");
                self.notices.notify(Notice::error(ANALYSIS_FAILED));
            }
            Err(_) => debug!("discarding analysis result after reset"),
        }

        stored
    }

    /// Move to `step` when its precondition holds and nothing is in flight.
    pub fn select_step(&self, step: WorkflowStep) -> Result<WorkflowStep, WorkflowError> {
        let mut state = self.lock();
        if state.in_flight {
            return Err(WorkflowError::InFlight);
        }
        if !state.step_enabled(step) {
            return Err(WorkflowError::StepUnavailable(step));
        }
        state.active_step = step;
        Ok(step)
    }

    /// Drop the file, info and result and return to the upload step.
    pub fn reset(&self) -> WorkflowSnapshot {
        let mut state = self.lock();
        state.selected_file = None;
        state.identity_info = None;
        state.result = None;
        state.active_step = WorkflowStep::Upload;
        state.epoch += 1;
        info!(in_flight = state.in_flight, "workflow reset");
        state.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<WorkflowState>) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// Clears `in_flight` if the analysis future is dropped mid-call.
struct InFlightGuard<'a> {
    state: &'a Mutex<WorkflowState>,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn arm(state: &'a Mutex<WorkflowState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self) -> MutexGuard<'a, WorkflowState> {
        self.armed = false;
        let mut state = lock_state(self.state);
        state.in_flight = false;
        state
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_state(self.state).in_flight = false;
        }
    }
}
