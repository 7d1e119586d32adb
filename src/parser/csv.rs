//! CSV/TSV export parser

use std::path::Path;

use crate::config::Config;
use crate::error::{io_err, Result};

use super::normalize::{RawRow, RawTable};
use super::Parser;

/// Parser for CSV and TSV exports
pub struct CsvParser;

impl Parser for CsvParser {
    fn decode(&self, bytes: &[u8], path: &Path, _config: &Config) -> Result<RawTable> {
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };
        let bytes = bytes.strip_prefix("\u{feff}".as_bytes()).unwrap_or(bytes);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(bytes);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| io_err(path, format!("failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line_num, result) in csv_reader.records().enumerate() {
            // +2 for 1-indexing and header
            let record = result
                .map_err(|e| io_err(path, format!("failed to read CSV row {}: {}", line_num + 2, e)))?;
            let cells = record.iter().map(parse_cell).collect();
            rows.push(RawRow::new(cells, line_num + 2));
        }

        Ok(RawTable { headers, rows })
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

fn parse_cell(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
