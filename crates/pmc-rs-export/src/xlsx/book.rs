// crates/pmc-rs-export/src/xlsx/book.rs
//! In-memory workbooks, saved through `rust_xlsxwriter`.

use std::path::Path;

use log::debug;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};

use crate::error::Result;

/// Fill of the header row.
pub const HEADER_FILL: u32 = 0x8DB4E2;
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(&self) -> Option<&str> {
        match self {
            Cell::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<Option<String>> for Cell {
    fn from(text: Option<String>) -> Self {
        text.map_or(Cell::Empty, Cell::Text)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Columns whose data cells wrap their text.
    pub wrap_columns: Vec<usize>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: &[&str]) -> Self {
        Self {
            name: sheet_name(&name.into()),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            wrap_columns: Vec::new(),
        }
    }

    /// Marks the column named `header` as wrapping.
    pub fn wrap(mut self, header: &str) -> Self {
        if let Some(column) = self.column(header) {
            self.wrap_columns.push(column);
        }
        self
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.header.iter().position(|h| h == header)
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// The cell of `row` under the column named `header`.
    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        self.rows.get(row)?.get(self.column(header)?)
    }
}

/// Sheet names are limited to 31 characters and may not contain `[]:*?/\`.
fn sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    pub sheets: Vec<Sheet>,
}

impl Book {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let header_format = Format::new()
            .set_bold()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(HEADER_FILL));
        let wrap_format = Format::new().set_text_wrap();

        let mut workbook = Workbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            for (col, text) in sheet.header.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, text, &header_format)?;
            }
            for (r, row) in sheet.rows.iter().enumerate() {
                let r = r as u32 + 1;
                for (col, cell) in row.iter().enumerate() {
                    let wrap = sheet.wrap_columns.contains(&col);
                    let col = col as u16;
                    match cell {
                        Cell::Empty => {}
                        Cell::Text(text) if wrap => {
                            worksheet.write_string_with_format(r, col, text, &wrap_format)?;
                        }
                        Cell::Text(text) => {
                            worksheet.write_string(r, col, text)?;
                        }
                        Cell::Number(n) => {
                            worksheet.write_number(r, col, *n)?;
                        }
                    }
                }
            }
        }
        workbook.save(path)?;
        debug!("Wrote workbook {} ({} sheets)", path.display(), self.sheets.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_sanitized() {
        let sheet = Sheet::new("a/b:c with a name that is far too long", &["X"]);
        assert_eq!(sheet.name, "a_b_c with a name that is far t");
        assert_eq!(sheet.name.chars().count(), 31);
    }

    #[test]
    fn cells_are_found_by_header() {
        let mut sheet = Sheet::new("S", &["Name", "Description"]).wrap("Description");
        sheet.push(vec!["x".into(), "long".into()]);
        assert_eq!(sheet.cell(0, "Description").and_then(Cell::text), Some("long"));
        assert_eq!(sheet.wrap_columns, vec![1]);
    }

    #[test]
    fn saves_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.xlsx");
        let mut sheet = Sheet::new("S", &["Name", "Offset"]);
        sheet.push(vec!["x".into(), 3.into()]);
        Book { sheets: vec![sheet] }.save(&path).expect("save");
        assert!(std::fs::metadata(&path).expect("metadata").len() > 0);
    }
}
