use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One finding from an extraction run, surfaced to the uploading
/// administrator. `row` is the 1-based worksheet row; sheet-level findings
/// carry no row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(row: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            row,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(row: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            row,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
