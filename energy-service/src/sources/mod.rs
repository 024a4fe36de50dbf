//! Raw file reading: discovery of spreadsheet exports under a data root and
//! conversion of each into a [`RawTable`] with its original column labels.

pub mod csv_file;
pub mod directory;
pub mod xlsx_file;

use std::path::{Path, PathBuf};

use time::{macros::datetime, Duration, PrimitiveDateTime};

use crate::pipeline::PipelineError;

pub use directory::{discover_files, DirectorySource};

/// Export flavour of a source file; drives how its column labels are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Semicolon separated text export; labels are used verbatim.
    Csv,
    /// Workbook export; labels carry numeric suffixes and unit annotations.
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" => Some(SourceFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// One cell as read from a file, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(PrimitiveDateTime),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) | RawCell::DateTime(_) => false,
        }
    }

    /// Numeric value of the cell. Text accepts a decimal comma when no dot is present.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawCell::Number(v) => Some(*v),
            RawCell::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                if !s.contains('.') && s.contains(',') {
                    s.replace(',', ".").parse().ok()
                } else {
                    s.parse().ok()
                }
            }
            RawCell::Empty | RawCell::DateTime(_) => None,
        }
    }
}

impl std::fmt::Display for RawCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawCell::Empty => f.write_str(""),
            RawCell::Text(s) => f.write_str(s),
            RawCell::Number(v) => write!(f, "{v}"),
            RawCell::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// A file's contents with headers preserved exactly as exported.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub format: SourceFormat,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

/// Days since 1899-12-30 (the spreadsheet epoch) to a naive timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<PrimitiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = (serial * 86_400.0).round() as i64;
    datetime!(1899-12-30 00:00).checked_add(Duration::seconds(seconds))
}

/// Reads one file according to its extension.
pub fn read_file(path: &Path, csv_delimiter: u8) -> Result<RawTable, PipelineError> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => csv_file::read_csv(path, csv_delimiter),
        Some(SourceFormat::Spreadsheet) => xlsx_file::read_xlsx(path),
        None => Err(PipelineError::UnsupportedFormat(PathBuf::from(path))),
    }
}
