use super::domain::{AnalysisResult, Transaction};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How long the copy control shows its confirmation state.
pub const COPY_CONFIRMATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTab {
    #[default]
    Summary,
    Transactions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// Presentation state for a finished analysis.
#[derive(Debug, Clone)]
pub struct ResultView {
    result: AnalysisResult,
    tab: ResultTab,
    copied_at: Option<Instant>,
}

impl ResultView {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result,
            tab: ResultTab::default(),
            copied_at: None,
        }
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    pub fn tab(&self) -> ResultTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: ResultTab) {
        self.tab = tab;
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        let mut rows = vec![
            SummaryRow {
                label: "Account Holder",
                value: self.result.name.clone(),
            },
            SummaryRow {
                label: "Email",
                value: self.result.email.clone(),
            },
            SummaryRow {
                label: "Opening Balance",
                value: self.result.opening_balance.clone(),
            },
            SummaryRow {
                label: "Closing Balance",
                value: self.result.closing_balance.clone(),
            },
        ];

        if let Some(password) = self.password() {
            rows.push(SummaryRow {
                label: "Generated Password",
                value: password.to_string(),
            });
        }

        rows
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.result.transactions.as_deref().unwrap_or_default()
    }

    /// Empty passwords are treated as absent, so nothing is offered for copy.
    pub fn password(&self) -> Option<&str> {
        self.result
            .generated_password
            .as_deref()
            .filter(|password| !password.is_empty())
    }

    /// Hand out the password for the clipboard and start the confirmation window.
    pub fn copy_password(&mut self, now: Instant) -> Option<&str> {
        if self.password().is_none() {
            return None;
        }
        self.copied_at = Some(now);
        self.password()
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .map(|copied_at| now.saturating_duration_since(copied_at) < COPY_CONFIRMATION)
            .unwrap_or(false)
    }
}
