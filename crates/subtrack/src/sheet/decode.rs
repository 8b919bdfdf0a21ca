use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{Result, SheetError, SourceError};

use super::{CellValue, RawSheet};

/// Decodes workbook bytes into the raw grid of one worksheet.
///
/// Container format (xls/xlsx) is auto-detected. `sheet_name` selects a
/// worksheet by name; the first sheet is used when unset.
pub fn decode_workbook(bytes: &[u8], sheet_name: Option<&str>) -> Result<RawSheet> {
    let cursor = Cursor::new(bytes);
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| SourceError::Decode(e.to_string()))?;

    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(SheetError::NoSheets.into());
    }

    let target = match sheet_name {
        Some(name) => {
            if !names.iter().any(|n| n.as_str() == name) {
                return Err(SheetError::MissingSheet(name.to_string()).into());
            }
            name.to_string()
        }
        None => names[0].clone(),
    };

    let range = workbook
        .worksheet_range(&target)
        .map_err(|e| SourceError::Decode(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(RawSheet::from_rows(rows))
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}
