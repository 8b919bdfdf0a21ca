use crate::sheet::CellValue;

/// Tokens register maintainers use to mean "no value".
const PLACEHOLDERS: [&str; 4] = ["---", "null", "undefined", "n/a"];

pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    PLACEHOLDERS
        .iter()
        .any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// The cell's trimmed display text; empty string for blank cells.
pub fn raw_text(cell: &CellValue) -> String {
    cell.to_display_string().trim().to_string()
}

/// Trimmed text with blanks, placeholders, and error cells filtered out.
pub fn clean_text(cell: &CellValue) -> Option<String> {
    if let CellValue::Error(_) = cell {
        return None;
    }
    let text = raw_text(cell);
    if text.is_empty() || is_placeholder(&text) {
        None
    } else {
        Some(text)
    }
}
