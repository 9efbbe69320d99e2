use metrics_exporter_prometheus::PrometheusHandle;
use statement_analyzer::workflows::statement::{Notice, NoticeLevel, NotificationSink, UploadedFile};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) notices: Arc<InMemoryNoticeBoard>,
}

/// Notices kept while nobody polls; older ones are dropped first.
pub(crate) const NOTICE_BOARD_CAPACITY: usize = 64;

/// Collects notices until an HTTP client drains them.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNoticeBoard {
    events: Arc<Mutex<VecDeque<Notice>>>,
}

impl NotificationSink for InMemoryNoticeBoard {
    fn notify(&self, notice: Notice) {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        if guard.len() == NOTICE_BOARD_CAPACITY {
            guard.pop_front();
        }
        guard.push_back(notice);
    }
}

impl InMemoryNoticeBoard {
    pub(crate) fn drain(&self) -> Vec<Notice> {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        guard.drain(..).collect()
    }
}

/// Prints notices to stderr so stdout carries only command output.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TerminalNotices;

impl NotificationSink for TerminalNotices {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{marker}] {}", notice.message);
    }
}

/// Read a statement from disk, guessing its media type from the extension.
pub(crate) fn load_statement(path: &Path) -> std::io::Result<UploadedFile> {
    let content = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "statement".to_string());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(UploadedFile::new(name, mime_type, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn notice_board_drains_in_order() {
        let board = InMemoryNoticeBoard::default();
        board.notify(Notice::success("File successfully selected: march.pdf"));
        board.notify(Notice::error("Please upload a PDF file first"));

        let drained = board.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Success);
        assert_eq!(drained[1].message, "Please upload a PDF file first");
        assert!(board.drain().is_empty());
    }

    #[test]
    fn notice_board_keeps_only_the_newest_notices() {
        let board = InMemoryNoticeBoard::default();
        for index in 0..NOTICE_BOARD_CAPACITY + 6 {
            board.notify(Notice::success(format!("notice {index}")));
        }

        let drained = board.drain();
        assert_eq!(drained.len(), NOTICE_BOARD_CAPACITY);
        assert_eq!(drained[0].message, "notice 6");
        assert_eq!(
            drained.last().map(|notice| notice.message.clone()),
            Some(format!("notice {}", NOTICE_BOARD_CAPACITY + 5))
        );
    }

    #[test]
    fn load_statement_guesses_media_type_from_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pdf_path = dir.path().join("march.pdf");
        std::fs::File::create(&pdf_path)
            .and_then(|mut file| file.write_all(b"%PDF-1.4"))
            .expect("pdf written");
        let txt_path = dir.path().join("notes.txt");
        std::fs::write(&txt_path, b"hello").expect("txt written");

        let pdf = load_statement(&pdf_path).expect("pdf loads");
        assert_eq!(pdf.name, "march.pdf");
        assert!(pdf.is_pdf());
        assert_eq!(pdf.size_bytes(), 8);

        let txt = load_statement(&txt_path).expect("txt loads");
        assert_eq!(txt.mime_type, "text/plain");
        assert!(!txt.is_pdf());
    }
}
