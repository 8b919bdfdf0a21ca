use serde::{Deserialize, Serialize};

use crate::normalize::StatusVocabulary;

/// Top-level ingestion configuration: one entry per dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub datasets: Vec<DatasetConfig>,
}

/// The two record shapes the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Document,
    ShopDrawing,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Document => "documents",
            RecordKind::ShopDrawing => "shop_drawings",
        }
    }

    /// Prefix used when synthesizing external identifiers.
    pub fn external_id_prefix(&self) -> &'static str {
        match self {
            RecordKind::Document => "DOC",
            RecordKind::ShopDrawing => "SHD",
        }
    }

    pub fn singular_label(&self) -> &'static str {
        match self {
            RecordKind::Document => "Document",
            RecordKind::ShopDrawing => "Shop Drawing",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical fields a worksheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Serial,
    Title,
    Vendor,
    DocumentType,
    Category,
    Discipline,
    System,
    SubSystem,
    Building,
    Floor,
    Status,
    SubmittedDate,
    Priority,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Serial => "serial",
            Field::Title => "title",
            Field::Vendor => "vendor",
            Field::DocumentType => "documentType",
            Field::Category => "category",
            Field::Discipline => "discipline",
            Field::System => "system",
            Field::SubSystem => "subSystem",
            Field::Building => "building",
            Field::Floor => "floor",
            Field::Status => "status",
            Field::SubmittedDate => "submittedDate",
            Field::Priority => "priority",
        }
    }

    /// Sentinel substituted when the column is absent or the cell is blank.
    pub fn default_value(&self) -> &'static str {
        match self {
            Field::Vendor | Field::Building => "Unknown",
            Field::DocumentType | Field::Category | Field::Discipline => "General",
            Field::System | Field::SubSystem | Field::Floor => "N/A",
            _ => "",
        }
    }
}

/// One row of the declarative header-recognition table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: Field,
    /// Regex matched case-insensitively against trimmed header cell text.
    pub pattern: String,
}

impl FieldSpec {
    pub fn new(field: Field, pattern: &str) -> Self {
        Self {
            field,
            pattern: pattern.to_string(),
        }
    }
}

/// Per-dataset extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    pub kind: RecordKind,
    /// Worksheet to read; first sheet when unset.
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default = "default_scan_limit")]
    pub header_scan_limit: usize,
    #[serde(default = "default_min_header_fields")]
    pub min_header_fields: usize,
    /// Fields that must all resolve for a row to count as the header.
    #[serde(default = "default_anchor_fields")]
    pub anchor_fields: Vec<Field>,
    /// Hard-coded header row index used when detection fails (0-based).
    #[serde(default)]
    pub fallback_header_row: Option<usize>,
    pub vocabulary: StatusVocabulary,
    /// Empty means: use the built-in table for `kind`.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_scan_limit() -> usize {
    20
}

fn default_min_header_fields() -> usize {
    2
}

fn default_anchor_fields() -> Vec<Field> {
    vec![Field::Title, Field::Status]
}

impl DatasetConfig {
    /// Built-in configuration for the document register.
    pub fn documents(vocabulary: StatusVocabulary) -> Self {
        Self {
            kind: RecordKind::Document,
            sheet_name: None,
            header_scan_limit: default_scan_limit(),
            min_header_fields: default_min_header_fields(),
            anchor_fields: default_anchor_fields(),
            fallback_header_row: None,
            vocabulary,
            fields: Vec::new(),
        }
    }

    /// Built-in configuration for the shop-drawing register.
    pub fn shop_drawings(vocabulary: StatusVocabulary) -> Self {
        Self {
            kind: RecordKind::ShopDrawing,
            ..Self::documents(vocabulary)
        }
    }

    /// The effective field-pattern table: explicit entries, or the built-in
    /// table for this record kind.
    pub fn field_specs(&self) -> Vec<FieldSpec> {
        if self.fields.is_empty() {
            default_field_specs(self.kind)
        } else {
            self.fields.clone()
        }
    }
}

/// Built-in header-recognition patterns.
///
/// `[\s_]*` rather than `\s*` because register exports name columns both ways
/// ("DOC NAME", "DOC_NAME").
pub fn default_field_specs(kind: RecordKind) -> Vec<FieldSpec> {
    let mut specs = vec![
        FieldSpec::new(Field::Serial, r"^s\.?[\s_]*n\.?$|serial|ref\.?[\s_]*no|submittal[\s_]*(no|#)"),
        FieldSpec::new(Field::Title, r"doc(ument)?[\s_]*(name|title)|^title$|description|drawing[\s_]*(name|title|no)"),
        FieldSpec::new(Field::Vendor, r"vendor|supplier|contractor|manufacturer"),
        FieldSpec::new(Field::Discipline, r"discipline|^disc\.?$|trade"),
        FieldSpec::new(Field::Status, r"status|review[\s_]*result"),
        FieldSpec::new(Field::SubmittedDate, r"submi(ssion|tted)[\s_]*date|date[\s_]*submitted|transmittal[\s_]*date|^date$"),
        FieldSpec::new(Field::Priority, r"priority"),
    ];

    match kind {
        RecordKind::Document => {
            specs.push(FieldSpec::new(
                Field::DocumentType,
                r"doc(ument)?[\s_]*type|type[\s_]*of[\s_]*doc",
            ));
            specs.push(FieldSpec::new(Field::Category, r"category|^cat\.?$"));
        }
        RecordKind::ShopDrawing => {
            specs.push(FieldSpec::new(Field::System, r"^system$|system[\s_]*name"));
            specs.push(FieldSpec::new(Field::SubSystem, r"sub[\s_-]*system"));
            specs.push(FieldSpec::new(Field::Building, r"building|^bldg\.?$"));
            specs.push(FieldSpec::new(Field::Floor, r"floor|^level$"));
        }
    }

    specs
}
