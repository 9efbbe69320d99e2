use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type every accepted statement must carry.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A user-selected statement file, content included.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes(),
        }
    }
}

// Content stays out of debug output.
impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// What views are allowed to see of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Identity details collected by the info step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "dob")]
    pub date_of_birth: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub description: String,
    /// Signed and currency formatted, e.g. `-$129.99`.
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn new(date: &str, description: &str, amount: &str, kind: TransactionKind) -> Self {
        Self {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            kind,
        }
    }
}

/// Outcome of a statement analysis, as returned by the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub name: String,
    pub email: String,
    pub opening_balance: String,
    pub closing_balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    #[default]
    Upload,
    Info,
    Result,
}

impl WorkflowStep {
    pub const fn ordered() -> [Self; 3] {
        [Self::Upload, Self::Info, Self::Result]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "Upload PDF",
            Self::Info => "Additional Info",
            Self::Result => "Results",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for WorkflowStep {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "upload" => Ok(Self::Upload),
            "info" => Ok(Self::Info),
            "result" | "results" => Ok(Self::Result),
            other => Err(format!("unknown workflow step '{other}'")),
        }
    }
}
