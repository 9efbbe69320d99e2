use std::sync::{Arc, Mutex};
use std::time::Duration;

use statement_analyzer::workflows::statement::{
    is_valid, InfoForm, Notice, NoticeLevel, NotificationSink, ResultTab, ResultView,
    SimulatedAnalysisClient, UploadedFile, WorkflowController, WorkflowError, WorkflowStep,
    PDF_MIME_TYPE,
};

#[derive(Default)]
struct RecordingNotices {
    events: Mutex<Vec<Notice>>,
}

impl NotificationSink for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.events.lock().expect("notice mutex").push(notice);
    }
}

impl RecordingNotices {
    fn last(&self) -> Option<Notice> {
        self.events.lock().expect("notice mutex").last().cloned()
    }
}

fn controller() -> (
    WorkflowController<SimulatedAnalysisClient, RecordingNotices>,
    Arc<RecordingNotices>,
) {
    let notices = Arc::new(RecordingNotices::default());
    let controller = WorkflowController::new(
        Arc::new(SimulatedAnalysisClient::new(Duration::ZERO)),
        notices.clone(),
    );
    (controller, notices)
}

fn statement() -> UploadedFile {
    UploadedFile::new("statement.pdf", PDF_MIME_TYPE, b"%PDF-1.4".to_vec())
}

fn is_generated_password(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.len() == 10
        && chars[..4].iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && chars[4..6].iter().all(char::is_ascii_digit)
        && "!@#$%^&*()".contains(chars[6])
        && chars[7..].iter().all(char::is_ascii_digit)
}

#[tokio::test]
async fn statement_walks_upload_info_and_result() {
    let (controller, notices) = controller();

    controller.submit_file(statement()).expect("pdf accepted");
    assert_eq!(controller.snapshot().active_step, WorkflowStep::Info);
    assert_eq!(
        notices.last().map(|notice| notice.message),
        Some("File successfully selected: statement.pdf".to_string())
    );

    let mut form = InfoForm::default();
    form.set_first_name("Jane");
    assert!(!form.submit_enabled());
    form.set_date_of_birth("1990-05-14");
    assert!(form.submit_enabled());
    controller.submit_info(&form).expect("valid info");
    assert_eq!(controller.snapshot().active_step, WorkflowStep::Info);

    let result = controller.analyze().await.expect("analysis succeeds");
    let snapshot = controller.snapshot();
    assert!(!snapshot.in_flight);
    assert_eq!(snapshot.active_step, WorkflowStep::Result);

    let mut view = ResultView::new(result);
    let password = view.password().expect("password generated").to_string();
    assert!(password.starts_with("JA9005"), "{password}");
    assert!(is_generated_password(&password), "{password}");

    view.select_tab(ResultTab::Transactions);
    assert_eq!(view.transactions().len(), 9);
    assert_eq!(view.transactions()[0].description, "Salary Deposit");

    let reset = controller.reset();
    assert_eq!(reset.active_step, WorkflowStep::Upload);
    assert!(reset.selected_file.is_none());
    assert!(reset.identity_info.is_none());
    assert!(reset.result.is_none());
}

#[tokio::test]
async fn analysis_without_a_file_is_refused() {
    let (controller, notices) = controller();

    let error = controller.analyze().await.expect_err("no file");

    assert!(matches!(error, WorkflowError::MissingFile));
    assert_eq!(controller.snapshot().active_step, WorkflowStep::Upload);
    let notice = notices.last().expect("notice raised");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Please upload a PDF file first");
}

#[test]
fn identity_validation_matches_the_form_rules() {
    assert!(is_valid("Jane", "1990-05-14"));
    assert!(!is_valid("   ", "1990-05-14"));
    assert!(!is_valid("Jane", "1990-5-14"));
    assert!(!is_valid("", ""));
}
