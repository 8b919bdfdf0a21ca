//! Builder for fabricating workbooks programmatically.
//!
//! Tests exercise the real decode path, so fixtures are genuine xlsx bytes
//! rather than hand-built grids.

#![allow(dead_code)]

use std::path::Path;

use rust_xlsxwriter::Workbook;

#[derive(Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
}

pub fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

pub fn number(value: f64) -> Cell {
    Cell::Number(value)
}

pub struct WorkbookBuilder {
    sheet_name: Option<String>,
    rows: Vec<Vec<Cell>>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            sheet_name: None,
            rows: Vec::new(),
        }
    }

    pub fn sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// Append a row of text cells.
    pub fn text_row(mut self, cells: &[&str]) -> Self {
        self.rows.push(cells.iter().map(|c| text(c)).collect());
        self
    }

    /// Append a row of mixed cells.
    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Append an empty row.
    pub fn blank_row(mut self) -> Self {
        self.rows.push(Vec::new());
        self
    }

    fn build(self) -> Workbook {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        if let Some(name) = &self.sheet_name {
            worksheet.set_name(name).unwrap();
        }
        for (r, row) in self.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => worksheet.write_string(r as u32, c as u16, s).unwrap(),
                    Cell::Number(n) => worksheet.write_number(r as u32, c as u16, *n).unwrap(),
                };
            }
        }
        workbook
    }

    pub fn bytes(self) -> Vec<u8> {
        self.build().save_to_buffer().unwrap()
    }

    pub fn save(self, path: &Path) {
        self.build().save(path).unwrap();
    }
}

impl Default for WorkbookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A small but fully populated document register.
pub fn document_register() -> WorkbookBuilder {
    WorkbookBuilder::new()
        .text_row(&["Project Delta Document Register"])
        .blank_row()
        .text_row(&[
            "SN",
            "DOC NAME",
            "VENDOR",
            "DOC TYPE",
            "CATEGORY",
            "DISCIPLINE",
            "STATUS",
            "SUBMISSION DATE",
            "PRIORITY",
        ])
        .row(vec![
            text("D-001"),
            text("Concrete Mix Design"),
            text("Acme Concrete"),
            text("Method Statement"),
            text("Structural"),
            text("Civil"),
            text("CODE1"),
            number(45000.0),
            text("high"),
        ])
        .row(vec![
            text("D-002"),
            text("Facade Panel Schedule"),
            text("Glazing Co"),
            text("Schedule"),
            text("Architectural"),
            text("Architecture"),
            text("UR (ATJV)"),
            text("2023-09-14"),
            text("medium"),
        ])
}

/// A shop-drawing register using the numeric status vocabulary.
pub fn shop_drawing_register() -> WorkbookBuilder {
    WorkbookBuilder::new()
        .text_row(&[
            "Drawing No",
            "System",
            "Sub-System",
            "Building",
            "Floor",
            "Status",
            "Date Submitted",
        ])
        .row(vec![
            text("SD-100"),
            text("HVAC"),
            text("Chilled Water"),
            text("B1"),
            text("L2"),
            text("1"),
            text("12/03/2024"),
        ])
        .row(vec![
            text("SD-101"),
            text("Electrical"),
            text("LV"),
            text("B1"),
            text("L3"),
            text("3"),
            text("---"),
        ])
}
