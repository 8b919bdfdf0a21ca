use std::collections::HashMap;

use regex::Regex;

use crate::config::{DatasetConfig, Field};
use crate::error::{ConfigError, SheetError};

use super::RawSheet;

/// Canonical field → zero-based column index, built from a detected header row.
pub type ColumnMap = HashMap<Field, usize>;

#[derive(Debug, Clone)]
pub struct HeaderDetection {
    pub header_row: usize,
    pub columns: ColumnMap,
}

/// Scans the top of a sheet for a row that plausibly contains column headers.
///
/// Real register exports carry no fixed schema: headers move down as metadata
/// rows are injected above them, and columns are reordered or renamed between
/// revisions. Matching each cell against per-field patterns tolerates all of
/// that.
pub struct HeaderDetector {
    patterns: Vec<(Field, Regex)>,
    scan_limit: usize,
    min_fields: usize,
    anchors: Vec<Field>,
}

impl HeaderDetector {
    pub fn from_config(config: &DatasetConfig) -> Result<Self, ConfigError> {
        let mut patterns = Vec::new();
        for spec in config.field_specs() {
            let regex =
                Regex::new(&format!("(?i){}", spec.pattern)).map_err(|e| {
                    ConfigError::InvalidPattern {
                        field: spec.field.label().to_string(),
                        reason: e.to_string(),
                    }
                })?;
            patterns.push((spec.field, regex));
        }

        Ok(Self {
            patterns,
            scan_limit: config.header_scan_limit,
            min_fields: config.min_header_fields,
            anchors: config.anchor_fields.clone(),
        })
    }

    /// Returns the first qualifying row within the scan window.
    pub fn detect(&self, sheet: &RawSheet) -> Result<HeaderDetection, SheetError> {
        let limit = sheet.row_count().min(self.scan_limit);

        for row in 0..limit {
            if sheet.is_row_empty(row) {
                continue;
            }
            let columns = self.map_row(sheet, row);
            if self.qualifies(&columns) {
                return Ok(HeaderDetection {
                    header_row: row,
                    columns,
                });
            }
        }

        Err(SheetError::HeaderNotFound { scanned: limit })
    }

    /// Builds a tentative column map from one row. First matching column wins
    /// per field, left to right.
    pub fn map_row(&self, sheet: &RawSheet, row: usize) -> ColumnMap {
        let mut columns = ColumnMap::new();

        for (field, regex) in &self.patterns {
            if columns.contains_key(field) {
                continue;
            }
            for (col, cell) in sheet.row(row).iter().enumerate() {
                let text = cell.to_display_string();
                let text = text.trim();
                if !text.is_empty() && regex.is_match(text) {
                    columns.insert(*field, col);
                    break;
                }
            }
        }

        columns
    }

    fn qualifies(&self, columns: &ColumnMap) -> bool {
        columns.len() >= self.min_fields
            && self.anchors.iter().all(|field| columns.contains_key(field))
    }
}
