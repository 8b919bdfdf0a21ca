use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info_span};

use crate::config::{DatasetConfig, Field, RecordKind};
use crate::error::{ConfigError, SheetError};
use crate::normalize::{clean_text, normalize_status, parse_date, raw_text};
use crate::sheet::{CellValue, ColumnMap, HeaderDetection, HeaderDetector, RawSheet};

use super::diagnostics::Diagnostic;
use super::record::{Priority, RecordDetails, SubmittalRecord};

pub struct ExtractionResult {
    pub records: Vec<SubmittalRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns one raw worksheet into a batch of normalized records plus the
/// diagnostics an administrator needs to judge the upload.
///
/// The extractor prefers over-inclusion with visible warnings to silent data
/// loss: a row is dropped only when it is empty, echoes the header, or its
/// title cell is unreadable.
pub struct RecordExtractor {
    config: Arc<DatasetConfig>,
    detector: HeaderDetector,
}

impl RecordExtractor {
    pub fn new(config: Arc<DatasetConfig>) -> Result<Self, ConfigError> {
        let detector = HeaderDetector::from_config(&config)?;
        Ok(Self { config, detector })
    }

    pub fn extract(
        &self,
        sheet: &RawSheet,
        now: DateTime<Utc>,
    ) -> Result<ExtractionResult, SheetError> {
        if sheet.row_count() == 0 {
            return Err(SheetError::EmptySheet);
        }

        let _span = info_span!("extract", dataset = self.config.kind.label()).entered();

        let mut diagnostics = Vec::new();
        let detection = self.detect_header(sheet, &mut diagnostics)?;
        self.warn_missing_columns(&detection.columns, &mut diagnostics);

        let mut records = Vec::new();
        for row in detection.header_row + 1..sheet.row_count() {
            if sheet.is_row_empty(row) {
                continue;
            }
            if self.is_header_echo(sheet, row, &detection) {
                debug!(row, "skipping repeated header row");
                continue;
            }

            let id = records.len() as u32 + 1;
            match self.extract_row(sheet, row, &detection.columns, id, now, &mut diagnostics) {
                Ok(record) => records.push(record),
                Err(message) => {
                    diagnostics.push(Diagnostic::error(Some(row as u32 + 1), message));
                }
            }
        }

        if records.is_empty() {
            diagnostics.push(Diagnostic::warning(
                None,
                "no data rows found below the header",
            ));
        }

        warn_duplicate_external_ids(&records, &mut diagnostics);

        debug!(
            records = records.len(),
            diagnostics = diagnostics.len(),
            "extraction complete"
        );

        Ok(ExtractionResult {
            records,
            diagnostics,
        })
    }

    fn detect_header(
        &self,
        sheet: &RawSheet,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<HeaderDetection, SheetError> {
        match self.detector.detect(sheet) {
            Ok(detection) => Ok(detection),
            Err(e) => match self.config.fallback_header_row {
                Some(row) if row < sheet.row_count() => {
                    // Blind fallback risks misaligning every field, so it is
                    // never silent.
                    diagnostics.push(Diagnostic::warning(
                        None,
                        format!("{}; assuming headers at row {}", e, row + 1),
                    ));
                    Ok(HeaderDetection {
                        header_row: row,
                        columns: self.detector.map_row(sheet, row),
                    })
                }
                _ => Err(e),
            },
        }
    }

    fn warn_missing_columns(&self, columns: &ColumnMap, diagnostics: &mut Vec<Diagnostic>) {
        let mut missing: Vec<&str> = self
            .config
            .field_specs()
            .iter()
            .map(|spec| spec.field)
            .filter(|field| !columns.contains_key(field))
            .map(|field| field.label())
            .collect();

        if !missing.is_empty() {
            missing.sort_unstable();
            diagnostics.push(Diagnostic::warning(
                None,
                format!(
                    "columns not found: {}; defaults substituted",
                    missing.join(", ")
                ),
            ));
        }
    }

    /// A data row whose identifier cells repeat the header labels is a
    /// duplicated header (or a trailing summary block), not data.
    fn is_header_echo(&self, sheet: &RawSheet, row: usize, detection: &HeaderDetection) -> bool {
        [Field::Title, Field::Serial].iter().any(|field| {
            detection.columns.get(field).is_some_and(|&col| {
                let label = raw_text(sheet.cell(detection.header_row, col));
                let value = raw_text(sheet.cell(row, col));
                !value.is_empty() && value.eq_ignore_ascii_case(&label)
            })
        })
    }

    fn extract_row(
        &self,
        sheet: &RawSheet,
        row: usize,
        columns: &ColumnMap,
        id: u32,
        now: DateTime<Utc>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<SubmittalRecord, String> {
        let kind = self.config.kind;
        let row_number = row as u32 + 1;

        // An unreadable title cell is the one row-scoped fatal condition:
        // without a name the record cannot be presented at all.
        if let Some(&col) = columns.get(&Field::Title) {
            if let CellValue::Error(code) = sheet.cell(row, col) {
                return Err(format!("unreadable title cell ({})", code));
            }
        }

        let title = columns
            .get(&Field::Title)
            .and_then(|&col| clean_text(sheet.cell(row, col)))
            .unwrap_or_else(|| {
                diagnostics.push(Diagnostic::warning(
                    Some(row_number),
                    "blank title; placeholder substituted",
                ));
                format!("Untitled {} {}", kind.singular_label(), id)
            });

        let raw_status = columns
            .get(&Field::Status)
            .map(|&col| raw_text(sheet.cell(row, col)))
            .unwrap_or_default();
        let status = normalize_status(&raw_status, self.config.vocabulary);
        if !status.recognized {
            diagnostics.push(Diagnostic::warning(
                Some(row_number),
                format!("unrecognized status code '{}'", raw_status),
            ));
        }

        let submitted_date = match columns.get(&Field::SubmittedDate) {
            Some(&col) => {
                let outcome = parse_date(sheet.cell(row, col));
                match outcome.value {
                    Some(value) => value,
                    None => {
                        diagnostics.push(Diagnostic::warning(
                            Some(row_number),
                            format!(
                                "unparseable submission date '{}'; using extraction time",
                                outcome.fallback.unwrap_or_default()
                            ),
                        ));
                        now
                    }
                }
            }
            None => now,
        };

        let priority = columns
            .get(&Field::Priority)
            .and_then(|&col| clean_text(sheet.cell(row, col)))
            .map(|text| {
                Priority::parse(&text).unwrap_or_else(|| {
                    diagnostics.push(Diagnostic::warning(
                        Some(row_number),
                        format!("invalid priority '{}'; defaulting to medium", text),
                    ));
                    Priority::default()
                })
            })
            .unwrap_or_default();

        let external_id = columns
            .get(&Field::Serial)
            .and_then(|&col| clean_text(sheet.cell(row, col)))
            .unwrap_or_else(|| {
                format!("{}-{}-{}", kind.external_id_prefix(), now.timestamp(), id)
            });

        let details = match kind {
            RecordKind::Document => RecordDetails::Document {
                document_type: self.field_text(sheet, row, columns, Field::DocumentType, diagnostics),
                category: self.field_text(sheet, row, columns, Field::Category, diagnostics),
            },
            RecordKind::ShopDrawing => RecordDetails::ShopDrawing {
                system: self.field_text(sheet, row, columns, Field::System, diagnostics),
                sub_system: self.field_text(sheet, row, columns, Field::SubSystem, diagnostics),
                building: self.field_text(sheet, row, columns, Field::Building, diagnostics),
                floor: self.field_text(sheet, row, columns, Field::Floor, diagnostics),
            },
        };

        Ok(SubmittalRecord {
            id,
            external_id,
            title,
            vendor: self.field_text(sheet, row, columns, Field::Vendor, diagnostics),
            discipline: self.field_text(sheet, row, columns, Field::Discipline, diagnostics),
            current_status: status.status,
            submitted_date,
            priority,
            last_updated: now,
            details,
        })
    }

    /// Classification-field read with the documented fallback chain: absent
    /// column or blank cell → the field's sentinel default; unreadable cell
    /// → default plus a warning.
    fn field_text(
        &self,
        sheet: &RawSheet,
        row: usize,
        columns: &ColumnMap,
        field: Field,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let Some(&col) = columns.get(&field) else {
            return field.default_value().to_string();
        };

        let cell = sheet.cell(row, col);
        if let CellValue::Error(code) = cell {
            diagnostics.push(Diagnostic::warning(
                Some(row as u32 + 1),
                format!(
                    "unreadable {} cell ({}); default substituted",
                    field.label(),
                    code
                ),
            ));
            return field.default_value().to_string();
        }

        clean_text(cell).unwrap_or_else(|| field.default_value().to_string())
    }
}

/// Duplicates are reported, never collapsed: which copy wins is a consumer
/// decision.
fn warn_duplicate_external_ids(records: &[SubmittalRecord], diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    for record in records {
        if !seen.insert(record.external_id.as_str()) && reported.insert(record.external_id.as_str())
        {
            let count = records
                .iter()
                .filter(|r| r.external_id == record.external_id)
                .count();
            diagnostics.push(Diagnostic::warning(
                None,
                format!(
                    "duplicate external id '{}' appears {} times",
                    record.external_id, count
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::diagnostics::Severity;
    use crate::normalize::{CanonicalStatus, StatusVocabulary};
    use chrono::TimeZone;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::Text(c.to_string())).collect()
    }

    fn extractor(kind: RecordKind) -> RecordExtractor {
        let config = match kind {
            RecordKind::Document => DatasetConfig::documents(StatusVocabulary::Compound),
            RecordKind::ShopDrawing => DatasetConfig::shop_drawings(StatusVocabulary::Compound),
        };
        RecordExtractor::new(Arc::new(config)).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_three_row_scenario() {
        let sheet = RawSheet::from_rows(vec![
            vec![],
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            vec![
                CellValue::Number(1.0),
                CellValue::Text("Code 1".to_string()),
                CellValue::Text("Design Spec".to_string()),
            ],
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 1);

        let record = &result.records[0];
        assert_eq!(record.title, "Design Spec");
        assert_eq!(record.current_status, CanonicalStatus::Code1);
        assert_eq!(record.external_id, "1");
        assert_eq!(record.id, 1);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            vec![],
            text_row(&["", "  ", ""]),
            text_row(&["7", "CODE2", "Pump Datasheet"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "Pump Datasheet");
    }

    #[test]
    fn test_header_echo_rows_are_skipped() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            text_row(&["1", "CODE1", "Spec A"]),
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            text_row(&["2", "CODE2", "Spec B"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1].title, "Spec B");
        assert_eq!(result.records[1].id, 2);
    }

    #[test]
    fn test_unreadable_title_isolates_row() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            text_row(&["1", "CODE1", "Spec A"]),
            vec![
                CellValue::Text("2".to_string()),
                CellValue::Text("CODE1".to_string()),
                CellValue::Error("#REF!".to_string()),
            ],
            text_row(&["3", "CODE1", "Spec C"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 2);

        let errors: Vec<_> = result.diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, Some(3));
    }

    #[test]
    fn test_blank_title_gets_placeholder_and_warning() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            text_row(&["1", "CODE1", "---"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "Untitled Document 1");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("blank title")));
    }

    #[test]
    fn test_missing_columns_warn_once_and_default() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["STATUS", "DOC_NAME"]),
            text_row(&["CODE1", "Spec A"]),
            text_row(&["CODE2", "Spec B"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 2);

        let record = &result.records[0];
        assert_eq!(record.vendor, "Unknown");
        assert_eq!(record.discipline, "General");
        assert_eq!(record.priority, Priority::Medium);
        assert_eq!(record.submitted_date, now());
        match &record.details {
            RecordDetails::Document { document_type, category } => {
                assert_eq!(document_type, "General");
                assert_eq!(category, "General");
            }
            _ => panic!("expected document details"),
        }

        let missing: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.message.contains("columns not found"))
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].row, None);
    }

    #[test]
    fn test_synthesized_external_ids_are_unique() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["STATUS", "DOC_NAME"]),
            text_row(&["CODE1", "Spec A"]),
            text_row(&["CODE2", "Spec B"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        let ids: HashSet<_> = result.records.iter().map(|r| r.external_id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| id.starts_with("DOC-")));
    }

    #[test]
    fn test_duplicate_external_ids_warn_but_are_kept() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            text_row(&["X-1", "CODE1", "Spec A"]),
            text_row(&["X-1", "CODE2", "Spec B"]),
            text_row(&["X-1", "CODE3", "Spec C"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 3);

        let dupes: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.message.contains("duplicate external id"))
            .collect();
        assert_eq!(dupes.len(), 1);
        assert!(dupes[0].message.contains("3 times"));
    }

    #[test]
    fn test_bad_date_and_priority_warn_per_row() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME", "SUBMISSION DATE", "PRIORITY"]),
            text_row(&["1", "CODE1", "Spec A", "N/A", "urgent"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        let record = &result.records[0];
        assert_eq!(record.submitted_date, now());
        assert_eq!(record.priority, Priority::Medium);

        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.row == Some(2) && d.message.contains("unparseable submission date")));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.row == Some(2) && d.message.contains("invalid priority 'urgent'")));
    }

    #[test]
    fn test_unrecognized_status_passes_through_with_warning() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME"]),
            text_row(&["1", "Waiting on client", "Spec A"]),
        ]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert_eq!(
            result.records[0].current_status,
            CanonicalStatus::Other("Waiting on client".to_string())
        );
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unrecognized status code")));
    }

    #[test]
    fn test_no_data_rows_is_a_warning_not_an_error() {
        let sheet = RawSheet::from_rows(vec![text_row(&["SN", "STATUS", "DOC_NAME"])]);

        let result = extractor(RecordKind::Document).extract(&sheet, now()).unwrap();
        assert!(result.records.is_empty());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("no data rows")));
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        let sheet = RawSheet::from_rows(vec![]);
        let result = extractor(RecordKind::Document).extract(&sheet, now());
        assert!(matches!(result, Err(SheetError::EmptySheet)));
    }

    #[test]
    fn test_header_not_found_without_fallback_is_an_error() {
        let sheet = RawSheet::from_rows(vec![text_row(&["just"]), text_row(&["notes"])]);
        let result = extractor(RecordKind::Document).extract(&sheet, now());
        assert!(matches!(result, Err(SheetError::HeaderNotFound { .. })));
    }

    #[test]
    fn test_fallback_header_row_is_used_with_warning() {
        let mut config = DatasetConfig::documents(StatusVocabulary::Compound);
        config.fallback_header_row = Some(0);
        let extractor = RecordExtractor::new(Arc::new(config)).unwrap();

        // Header labels no pattern recognizes.
        let sheet = RawSheet::from_rows(vec![
            text_row(&["COL_A", "COL_B"]),
            text_row(&["1", "Widget"]),
        ]);

        let result = extractor.extract(&sheet, now()).unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.row.is_none() && d.message.contains("assuming headers at row 1")));
        // Nothing mapped: the record is all defaults and placeholder title.
        assert_eq!(result.records[0].title, "Untitled Document 1");
        assert_eq!(result.records[0].current_status, CanonicalStatus::Pending);
    }

    #[test]
    fn test_shop_drawing_details_extracted() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["Drawing No", "System", "Sub-System", "Building", "Floor", "Status"]),
            text_row(&["SD-100", "HVAC", "Chilled Water", "B2", "L3", "UR (ATJV)"]),
        ]);

        let result = extractor(RecordKind::ShopDrawing).extract(&sheet, now()).unwrap();
        let record = &result.records[0];
        assert_eq!(record.current_status, CanonicalStatus::UrAtjv);
        match &record.details {
            RecordDetails::ShopDrawing { system, sub_system, building, floor } => {
                assert_eq!(system, "HVAC");
                assert_eq!(sub_system, "Chilled Water");
                assert_eq!(building, "B2");
                assert_eq!(floor, "L3");
            }
            _ => panic!("expected shop drawing details"),
        }
    }

    #[test]
    fn test_extraction_is_idempotent_for_fixed_now() {
        let sheet = RawSheet::from_rows(vec![
            text_row(&["SN", "STATUS", "DOC_NAME", "SUBMISSION DATE"]),
            text_row(&["1", "CODE1", "Spec A", "2023-06-01"]),
            text_row(&["", "CODE2", "Spec B", "bad date"]),
        ]);

        let extractor = extractor(RecordKind::Document);
        let first = extractor.extract(&sheet, now()).unwrap();
        let second = extractor.extract(&sheet, now()).unwrap();

        assert_eq!(first.records, second.records);
        assert_eq!(first.diagnostics, second.diagnostics);
    }
}
