use std::path::Path;

use csv::ByteRecord;

use super::{RawCell, RawTable, SourceFormat};
use crate::pipeline::PipelineError;

fn decode_field(field: &[u8]) -> RawCell {
    // Exports are not guaranteed to be UTF-8; keep what decodes.
    let text = String::from_utf8_lossy(field);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(trimmed.to_string())
    }
}

fn record_to_cells(record: &ByteRecord, width: usize) -> Vec<RawCell> {
    let mut cells: Vec<RawCell> = record.iter().map(decode_field).collect();
    cells.resize(width.max(cells.len()), RawCell::Empty);
    cells
}

/// Delimited text export.
///
/// The first record is the header row; short rows are padded with empty
/// cells. A row that cannot be read at all fails the whole file.
pub fn read_csv(path: &Path, delimiter: u8) -> Result<RawTable, PipelineError> {
    let read_err = |message: String| PipelineError::Read {
        path: path.to_path_buf(),
        message,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_err(format!("failed to open CSV file: {e}")))?;

    let headers: Vec<String> = rdr
        .byte_headers()
        .map_err(|e| read_err(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result.map_err(|e| read_err(format!("failed to read CSV record: {e}")))?;
        rows.push(record_to_cells(&record, headers.len()));
    }

    Ok(RawTable {
        format: SourceFormat::Csv,
        headers,
        rows,
    })
}
