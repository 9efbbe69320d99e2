use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use serde_json::Value;
use tokio::sync::Notify;

use crate::workflows::statement::client::{AnalysisClient, AnalysisError, SimulatedAnalysisClient};
use crate::workflows::statement::controller::WorkflowController;
use crate::workflows::statement::domain::{
    AnalysisResult, IdentityInfo, UploadedFile, PDF_MIME_TYPE,
};
use crate::workflows::statement::info::InfoForm;
use crate::workflows::statement::notice::{Notice, NoticeLevel, NotificationSink};
use crate::workflows::statement::password::SPECIAL_CHARACTERS;
use crate::workflows::statement::upload::UploadPolicy;

pub(super) const BOUNDARY: &str = "statement-analyzer-boundary";

#[derive(Default)]
pub(super) struct MemoryNotices {
    events: Mutex<Vec<Notice>>,
}

impl NotificationSink for MemoryNotices {
    fn notify(&self, notice: Notice) {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
    }
}

impl MemoryNotices {
    pub(super) fn messages(&self) -> Vec<(NoticeLevel, String)> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .iter()
            .map(|notice| (notice.level, notice.message.clone()))
            .collect()
    }

    pub(super) fn last(&self) -> Option<(NoticeLevel, String)> {
        self.messages().pop()
    }
}

/// Analysis client whose outcome and timing are controlled by the test.
pub(super) struct ScriptedClient {
    inner: SimulatedAnalysisClient,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
    fail: bool,
}

impl ScriptedClient {
    pub(super) fn succeeding() -> Arc<Self> {
        Arc::new(Self::build(None, false))
    }

    pub(super) fn failing() -> Arc<Self> {
        Arc::new(Self::build(None, true))
    }

    /// The call parks until the returned [`Notify`] is signalled.
    pub(super) fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Arc::new(Self::build(Some(gate.clone()), false)), gate)
    }

    fn build(gate: Option<Arc<Notify>>, fail: bool) -> Self {
        Self {
            inner: SimulatedAnalysisClient::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
            gate,
            fail,
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) async fn wait_for_call(&self) {
        while self.calls() == 0 {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AnalysisClient for ScriptedClient {
    async fn analyze(
        &self,
        file: &UploadedFile,
        info: Option<&IdentityInfo>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(AnalysisError::Rejected {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        self.inner.analyze(file, info).await
    }
}

pub(super) type TestController = WorkflowController<ScriptedClient, MemoryNotices>;

pub(super) fn controller_with(
    client: Arc<ScriptedClient>,
) -> (Arc<TestController>, Arc<MemoryNotices>) {
    controller_with_policy(client, UploadPolicy::uncapped())
}

pub(super) fn controller_with_policy(
    client: Arc<ScriptedClient>,
    policy: UploadPolicy,
) -> (Arc<TestController>, Arc<MemoryNotices>) {
    let notices = Arc::new(MemoryNotices::default());
    let controller = Arc::new(WorkflowController::with_upload_policy(
        client,
        notices.clone(),
        policy,
    ));
    (controller, notices)
}

pub(super) fn statement_pdf() -> UploadedFile {
    UploadedFile::new("statement.pdf", PDF_MIME_TYPE, b"%PDF-1.4\n%mock statement\n".to_vec())
}

pub(super) fn png_scan() -> UploadedFile {
    UploadedFile::new("scan.png", "image/png", vec![0x89, b'P', b'N', b'G'])
}

pub(super) fn jane_form() -> InfoForm {
    InfoForm::new("Jane", "1990-05-14")
}

pub(super) fn assert_display_password(password: &str) {
    let chars: Vec<char> = password.chars().collect();
    assert_eq!(chars.len(), 10, "{password}");
    assert!(
        chars[..4]
            .iter()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "{password}"
    );
    assert!(chars[4..6].iter().all(char::is_ascii_digit), "{password}");
    assert!(SPECIAL_CHARACTERS.contains(&chars[6]), "{password}");
    assert!(chars[7..].iter().all(char::is_ascii_digit), "{password}");
}

pub(super) fn multipart_request(uri: &str, parts: &[MultipartPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            MultipartPart::File {
                name,
                mime_type,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {mime_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
            MultipartPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) enum MultipartPart<'a> {
    File {
        name: &'a str,
        mime_type: &'a str,
        content: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub(super) fn pdf_part(content: &[u8]) -> MultipartPart<'_> {
    MultipartPart::File {
        name: "statement.pdf",
        mime_type: PDF_MIME_TYPE,
        content,
    }
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json encodes")))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}
