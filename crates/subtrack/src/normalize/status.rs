use serde::{Deserialize, Serialize};

use super::text::is_placeholder;

/// Which status vocabulary a dataset's source project uses.
///
/// The two projects never shared a controlled vocabulary: one records review
/// outcomes as bare numerals and letter codes, the other as compound review
/// codes. Keeping the tables separate stops `"1"` in one register from
/// colliding with anything in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusVocabulary {
    Numeric,
    Compound,
}

/// Closed status enumeration, plus a passthrough for tokens no table knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalStatus {
    Code1,
    Code2,
    Code3,
    Code4,
    UrAtjv,
    ArAtjv,
    UrDar,
    RtnAtls,
    RtnAs,
    Pending,
    Other(String),
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CanonicalStatus::Code1 => "CODE1",
            CanonicalStatus::Code2 => "CODE2",
            CanonicalStatus::Code3 => "CODE3",
            CanonicalStatus::Code4 => "CODE4",
            CanonicalStatus::UrAtjv => "UR (ATJV)",
            CanonicalStatus::ArAtjv => "AR (ATJV)",
            CanonicalStatus::UrDar => "UR (DAR)",
            CanonicalStatus::RtnAtls => "RTN (ATLS)",
            CanonicalStatus::RtnAs => "RTN (AS)",
            CanonicalStatus::Pending => "Pending",
            CanonicalStatus::Other(raw) => raw,
        }
    }

    fn from_canonical(s: &str) -> Self {
        match s {
            "CODE1" => CanonicalStatus::Code1,
            "CODE2" => CanonicalStatus::Code2,
            "CODE3" => CanonicalStatus::Code3,
            "CODE4" => CanonicalStatus::Code4,
            "UR (ATJV)" => CanonicalStatus::UrAtjv,
            "AR (ATJV)" => CanonicalStatus::ArAtjv,
            "UR (DAR)" => CanonicalStatus::UrDar,
            "RTN (ATLS)" => CanonicalStatus::RtnAtls,
            "RTN (AS)" => CanonicalStatus::RtnAs,
            "Pending" => CanonicalStatus::Pending,
            other => CanonicalStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CanonicalStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(CanonicalStatus::from_canonical(&s))
    }
}

/// Result of status normalization. `recognized` is false only on the
/// passthrough tier, so the caller can record a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusOutcome {
    pub status: CanonicalStatus,
    pub recognized: bool,
}

impl StatusOutcome {
    fn known(status: CanonicalStatus) -> Self {
        Self {
            status,
            recognized: true,
        }
    }
}

/// Maps a raw status token onto the canonical enumeration.
///
/// Tiers, in priority order: blank/placeholder, exact table for the active
/// vocabulary, bounded substring fallback, passthrough. Lookup keys are
/// uppercased with all whitespace stripped, so "UR (ATJV)" and "UR(ATJV)"
/// land on the same table entry while the canonical spelling keeps its
/// punctuation.
pub fn normalize_status(raw: &str, vocabulary: StatusVocabulary) -> StatusOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_placeholder(trimmed) {
        return StatusOutcome::known(CanonicalStatus::Pending);
    }

    let key = lookup_key(trimmed);

    let exact = match vocabulary {
        StatusVocabulary::Numeric => numeric_exact(&key),
        StatusVocabulary::Compound => compound_exact(&key),
    };
    if let Some(status) = exact {
        return StatusOutcome::known(status);
    }

    if let Some(status) = fuzzy_match(&key, vocabulary) {
        return StatusOutcome::known(status);
    }

    StatusOutcome {
        status: CanonicalStatus::Other(trimmed.to_string()),
        recognized: false,
    }
}

fn lookup_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn numeric_exact(key: &str) -> Option<CanonicalStatus> {
    let status = match key {
        "1" | "CODE1" | "A" | "APPROVED" => CanonicalStatus::Code1,
        "2" | "CODE2" | "B" | "APPROVEDASNOTED" => CanonicalStatus::Code2,
        "3" | "CODE3" | "C" | "REVISEANDRESUBMIT" | "RESUBMIT" => CanonicalStatus::Code3,
        "4" | "CODE4" | "D" | "REJECTED" => CanonicalStatus::Code4,
        "PENDING" | "OPEN" | "SUBMITTED" => CanonicalStatus::Pending,
        _ => return None,
    };
    Some(status)
}

fn compound_exact(key: &str) -> Option<CanonicalStatus> {
    let status = match key {
        "CODE1" | "C1" => CanonicalStatus::Code1,
        "CODE2" | "C2" => CanonicalStatus::Code2,
        "CODE3" | "C3" => CanonicalStatus::Code3,
        "CODE4" | "C4" => CanonicalStatus::Code4,
        "UR(ATJV)" | "URATJV" | "UNDERREVIEW(ATJV)" => CanonicalStatus::UrAtjv,
        "AR(ATJV)" | "ARATJV" | "ADVANCEREVIEW(ATJV)" => CanonicalStatus::ArAtjv,
        "UR(DAR)" | "URDAR" => CanonicalStatus::UrDar,
        "RTN(ATLS)" | "RTNATLS" => CanonicalStatus::RtnAtls,
        "RTN(AS)" | "RTNAS" => CanonicalStatus::RtnAs,
        "PENDING" | "OPEN" => CanonicalStatus::Pending,
        _ => return None,
    };
    Some(status)
}

/// Substring fallback for the broad categories only. Anything subtler than
/// reject/return or under-review stays on the passthrough tier: loose
/// matching on short tokens ("AR") misclassifies more than it rescues.
fn fuzzy_match(key: &str, vocabulary: StatusVocabulary) -> Option<CanonicalStatus> {
    if key.contains("REJECT") || key.contains("RTN") {
        return Some(match vocabulary {
            StatusVocabulary::Numeric => CanonicalStatus::Code4,
            StatusVocabulary::Compound => CanonicalStatus::RtnAtls,
        });
    }

    if vocabulary == StatusVocabulary::Compound {
        if key.contains("UNDERREVIEW") || key.starts_with("UR") {
            if key.contains("DAR") {
                return Some(CanonicalStatus::UrDar);
            }
            return Some(CanonicalStatus::UrAtjv);
        }
    }

    None
}
