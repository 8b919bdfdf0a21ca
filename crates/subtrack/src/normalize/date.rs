use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::sheet::CellValue;

use super::text::{is_placeholder, raw_text};

/// Spreadsheet serial dates count days from this epoch.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Bare numbers below this are not plausible serial dates (40000 ≈ 2009).
/// Typed date cells are exempt: the source already committed to a date there.
pub const MIN_PLAUSIBLE_SERIAL: f64 = 40000.0;

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Outcome of date normalization. Never an error: a value that cannot be
/// read becomes `fallback: Some(raw)` and the caller substitutes "now",
/// recording the substitution as a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct DateOutcome {
    pub value: Option<DateTime<Utc>>,
    /// The raw offending value when parsing failed.
    pub fallback: Option<String>,
}

impl DateOutcome {
    fn parsed(value: DateTime<Utc>) -> Self {
        Self {
            value: Some(value),
            fallback: None,
        }
    }

    fn failed(raw: impl Into<String>) -> Self {
        Self {
            value: None,
            fallback: Some(raw.into()),
        }
    }
}

/// Total date parser over every cell shape a register export produces.
pub fn parse_date(cell: &CellValue) -> DateOutcome {
    match cell {
        CellValue::DateTime(serial) => match serial_to_datetime(*serial) {
            Some(value) => DateOutcome::parsed(value),
            None => DateOutcome::failed(format!("{}", serial)),
        },
        CellValue::Number(n) => {
            if *n < MIN_PLAUSIBLE_SERIAL {
                return DateOutcome::failed(cell.to_display_string());
            }
            match serial_to_datetime(*n) {
                Some(value) => DateOutcome::parsed(value),
                None => DateOutcome::failed(cell.to_display_string()),
            }
        }
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Empty => DateOutcome::failed("(blank)"),
        CellValue::Bool(_) | CellValue::Error(_) => {
            DateOutcome::failed(cell.to_display_string())
        }
    }
}

fn parse_date_text(text: &str) -> DateOutcome {
    let trimmed = text.trim();
    if trimmed.is_empty() || is_placeholder(trimmed) {
        return DateOutcome::failed(if trimmed.is_empty() {
            "(blank)".to_string()
        } else {
            trimmed.to_string()
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return DateOutcome::parsed(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return DateOutcome::parsed(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            let naive = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
            return DateOutcome::parsed(Utc.from_utc_datetime(&naive));
        }
    }

    // Serial dates survive CSV round-trips as bare numeric strings.
    if let Ok(n) = trimmed.parse::<f64>() {
        if n >= MIN_PLAUSIBLE_SERIAL {
            if let Some(value) = serial_to_datetime(n) {
                return DateOutcome::parsed(value);
            }
        }
    }

    DateOutcome::failed(trimmed)
}

fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round();
    if seconds.abs() >= i64::MAX as f64 {
        return None;
    }
    let moment = epoch.checked_add_signed(Duration::seconds(seconds as i64))?;
    Some(Utc.from_utc_datetime(&moment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn parsed_date(cell: &CellValue) -> DateTime<Utc> {
        let outcome = parse_date(cell);
        assert_eq!(outcome.fallback, None, "expected a parse for {:?}", cell);
        outcome.value.unwrap()
    }

    #[test]
    fn test_serial_45000_is_2023() {
        let value = parsed_date(&CellValue::Number(45000.0));
        assert_eq!(value.year(), 2023);
        assert_eq!(value.month(), 3);
    }

    #[test]
    fn test_serial_below_threshold_falls_back() {
        let outcome = parse_date(&CellValue::Number(5.0));
        assert!(outcome.value.is_none());
        assert_eq!(outcome.fallback.as_deref(), Some("5"));
    }

    #[test]
    fn test_serial_exactly_at_threshold_is_accepted() {
        let value = parsed_date(&CellValue::Number(40000.0));
        assert_eq!(value.year(), 2009);
    }

    #[test]
    fn test_negative_number_falls_back() {
        let outcome = parse_date(&CellValue::Number(-3.0));
        assert!(outcome.value.is_none());
    }

    #[test]
    fn test_typed_date_cell_is_converted_unconditionally() {
        // A typed date below the bare-number threshold still converts.
        let value = parsed_date(&CellValue::DateTime(100.0));
        assert_eq!(value.year(), 1900);
    }

    #[test]
    fn test_iso_date_string() {
        let value = parsed_date(&CellValue::Text("2024-02-29".to_string()));
        assert_eq!((value.year(), value.month(), value.day()), (2024, 2, 29));
    }

    #[test]
    fn test_rfc3339_string() {
        let value = parsed_date(&CellValue::Text("2023-06-15T10:30:00+02:00".to_string()));
        assert_eq!(value.year(), 2023);
    }

    #[test]
    fn test_day_first_locale_string() {
        let value = parsed_date(&CellValue::Text("25/12/2023".to_string()));
        assert_eq!((value.day(), value.month()), (25, 12));
    }

    #[test]
    fn test_numeric_string_parsed_as_serial() {
        let value = parsed_date(&CellValue::Text("45000".to_string()));
        assert_eq!(value.year(), 2023);
    }

    #[test]
    fn test_sentinels_fall_back() {
        for raw in ["---", "N/A", "", "   "] {
            let outcome = parse_date(&CellValue::Text(raw.to_string()));
            assert!(outcome.value.is_none(), "expected fallback for {:?}", raw);
            assert!(outcome.fallback.is_some());
        }
    }

    #[test]
    fn test_unparseable_inputs_never_panic() {
        for cell in [
            CellValue::Text("sometime soon".to_string()),
            CellValue::Bool(true),
            CellValue::Error("#DIV/0!".to_string()),
            CellValue::Empty,
            CellValue::Number(f64::NAN),
            CellValue::Number(f64::INFINITY),
        ] {
            let outcome = parse_date(&cell);
            assert!(outcome.value.is_none());
            assert!(outcome.fallback.is_some());
        }
    }
}
