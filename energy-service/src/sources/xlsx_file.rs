use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::{excel_serial_to_datetime, RawCell, RawTable, SourceFormat};
use crate::pipeline::PipelineError;

fn to_cell(data: &Data) -> RawCell {
    match data {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                RawCell::Empty
            } else {
                RawCell::Text(trimmed.to_string())
            }
        }
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            // Pure time-of-day cells have no date part; keep them as a day fraction.
            if serial < 1.0 {
                RawCell::Number(serial)
            } else {
                excel_serial_to_datetime(serial)
                    .map(RawCell::DateTime)
                    .unwrap_or(RawCell::Empty)
            }
        }
    }
}

fn header_label(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// First worksheet of a workbook export.
pub fn read_xlsx(path: &Path) -> Result<RawTable, PipelineError> {
    let read_err = |message: String| PipelineError::Read {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook =
        open_workbook_auto(path).map_err(|e| read_err(format!("failed to open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| read_err("workbook has no worksheet".to_string()))?
        .map_err(|e| read_err(format!("failed to read worksheet: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first) => first.iter().map(header_label).collect(),
        None => return Err(read_err("worksheet is empty".to_string())),
    };

    let rows = rows
        .map(|row| {
            let mut cells: Vec<RawCell> = row.iter().map(to_cell).collect();
            cells.resize(headers.len().max(cells.len()), RawCell::Empty);
            cells
        })
        .collect();

    Ok(RawTable {
        format: SourceFormat::Spreadsheet,
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn cell_conversion_covers_value_kinds() {
        assert_eq!(to_cell(&Data::Float(2.5)), RawCell::Number(2.5));
        assert_eq!(to_cell(&Data::Int(3)), RawCell::Number(3.0));
        assert_eq!(to_cell(&Data::String("  ".into())), RawCell::Empty);
        assert_eq!(
            to_cell(&Data::String("00:15:00".into())),
            RawCell::Text("00:15:00".into())
        );
        assert_eq!(to_cell(&Data::Empty), RawCell::Empty);
    }

    #[test]
    fn serial_dates_become_timestamps() {
        assert_eq!(
            excel_serial_to_datetime(45658.0).map(RawCell::DateTime),
            Some(RawCell::DateTime(datetime!(2025-01-01 00:00)))
        );
    }

    #[test]
    fn reads_header_row_and_typed_cells() {
        use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_fmt = Format::new().set_num_format("dd/mm/yyyy");
        let time_fmt = Format::new().set_num_format("hh:mm:ss");
        sheet.write_string(0, 0, "Date").unwrap();
        sheet.write_string(0, 1, "Time").unwrap();
        sheet.write_string(0, 2, "TOUR_A_(TGBT_D14) kW sys avg 4").unwrap();
        let day = ExcelDateTime::from_ymd(2025, 3, 3).unwrap();
        let quarter = ExcelDateTime::from_hms(0, 15, 0).unwrap();
        sheet.write_datetime_with_format(1, 0, &day, &date_fmt).unwrap();
        sheet.write_datetime_with_format(1, 1, &quarter, &time_fmt).unwrap();
        sheet.write_number(1, 2, 1.5).unwrap();
        workbook.save(file.path()).unwrap();

        let table = read_xlsx(file.path()).unwrap();
        assert_eq!(table.format, SourceFormat::Spreadsheet);
        assert_eq!(
            table.headers,
            vec!["Date", "Time", "TOUR_A_(TGBT_D14) kW sys avg 4"]
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], RawCell::DateTime(datetime!(2025-03-03 00:00)));
        match &table.rows[0][1] {
            RawCell::Number(fraction) => assert!((fraction - 15.0 / 1440.0).abs() < 1e-9),
            other => panic!("time-of-day cell read as {other:?}"),
        }
        assert_eq!(table.rows[0][2], RawCell::Number(1.5));
    }

    #[test]
    fn garbage_file_is_a_read_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"not a zip archive").unwrap();
        let err = read_xlsx(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
    }
}
