use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::CanonicalStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Case-insensitive parse; `None` for anything outside the enumeration.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Kind-specific fields, resolved at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "recordKind")]
pub enum RecordDetails {
    #[serde(rename = "document", rename_all = "camelCase")]
    Document {
        document_type: String,
        category: String,
    },
    #[serde(rename = "shopDrawing", rename_all = "camelCase")]
    ShopDrawing {
        system: String,
        sub_system: String,
        building: String,
        floor: String,
    },
}

/// One normalized submittal row.
///
/// Invariants the extractor upholds: `title` is never empty,
/// `current_status` is always populated, `submitted_date` is always a real
/// timestamp. `id` and a synthesized `external_id` are unique within one
/// batch but carry no identity across refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittalRecord {
    pub id: u32,
    pub external_id: String,
    pub title: String,
    pub vendor: String,
    pub discipline: String,
    pub current_status: CanonicalStatus,
    pub submitted_date: DateTime<Utc>,
    pub priority: Priority,
    /// Stamped at extraction time, not sourced from the sheet.
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub details: RecordDetails,
}
