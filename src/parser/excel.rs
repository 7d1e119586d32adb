//! Workbook export parser (xlsx, xltx, xls, xlsb, ods)

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDateTime, Timelike};

use crate::config::Config;
use crate::error::{io_err, Result};

use super::normalize::{RawRow, RawTable};
use super::Parser;

/// Parser for binary spreadsheet exports. The workbook flavor is
/// detected from content, so the file extension does not matter.
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn decode(&self, bytes: &[u8], path: &Path, config: &Config) -> Result<RawTable> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| io_err(path, format!("failed to open workbook: {}", e)))?;

        let sheet_name = match config.input_sheet {
            Some(ref name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| io_err(path, "no sheets found in workbook"))?,
        };

        let range: Range<Data> = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| io_err(path, format!("failed to read sheet {}: {}", sheet_name, e)))?;

        Ok(range_to_table(&range))
    }

    fn name(&self) -> &'static str {
        "excel"
    }
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_to_string(cell).unwrap_or_default())
            .collect(),
        None => return RawTable::default(),
    };

    let rows = rows_iter
        .enumerate()
        .map(|(line_num, row)| {
            let cells = row.iter().map(cell_to_string).collect();
            RawRow::new(cells, line_num + 2) // +2 for 1-indexing and header
        })
        .collect();

    RawTable { headers, rows }
}

fn cell_to_string(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => format_datetime(datetime),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Dates without a time of day are written as plain dates
fn format_datetime(datetime: NaiveDateTime) -> String {
    let time = datetime.time();
    if time.hour() == 0 && time.minute() == 0 && time.second() == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
