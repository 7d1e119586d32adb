//! Parser layer for reading order exports

mod csv;
mod excel;
mod html;
mod normalize;

use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::{io_err, Result};

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;
pub use self::html::HtmlParser;
pub use self::normalize::{conform, ParseReport, ParsedFile, QuarantinedRow, RawRow, RawTable};

/// Trait for decoding an export into a raw table
pub trait Parser: Send + Sync {
    /// Decode the file contents. The first row is the header.
    fn decode(&self, bytes: &[u8], path: &Path, config: &Config) -> Result<RawTable>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Serialized form of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Html,
    Csv,
    Workbook,
}

const MARKUP_MARKERS: [&str; 4] = ["<html", "<!doctype", "<head", "<table"];

/// Detect the input format from content, falling back to the extension.
///
/// A markup marker on the first non-empty line wins over any extension,
/// since marketplace "Excel" downloads are often HTML tables in disguise.
pub fn detect_format(bytes: &[u8], path: &Path) -> InputFormat {
    let head = &bytes[..bytes.len().min(4096)];
    let text = String::from_utf8_lossy(head);
    let first_line = text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_lowercase();

    if MARKUP_MARKERS.iter().any(|m| first_line.starts_with(m)) {
        return InputFormat::Html;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "csv" | "tsv" => InputFormat::Csv,
        _ => InputFormat::Workbook,
    }
}

/// Picks a decoder by format and conforms its output to the schema
pub struct ParserFactory {
    html: HtmlParser,
    csv: CsvParser,
    excel: ExcelParser,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    pub fn new() -> Self {
        Self {
            html: HtmlParser,
            csv: CsvParser,
            excel: ExcelParser,
        }
    }

    /// Get the decoder for a format
    pub fn get_parser(&self, format: InputFormat) -> &dyn Parser {
        match format {
            InputFormat::Html => &self.html,
            InputFormat::Csv => &self.csv,
            InputFormat::Workbook => &self.excel,
        }
    }

    /// Read, decode and normalize a file
    pub fn parse(&self, path: &Path, config: &Config) -> Result<ParsedFile> {
        let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
        self.parse_bytes(&bytes, path, config)
    }

    /// Decode and normalize in-memory contents; `path` drives detection and messages
    pub fn parse_bytes(&self, bytes: &[u8], path: &Path, config: &Config) -> Result<ParsedFile> {
        let format = detect_format(bytes, path);
        let parser = self.get_parser(format);
        let raw = parser.decode(bytes, path, config)?;
        info!(
            parser = parser.name(),
            rows = raw.rows.len(),
            columns = raw.headers.len(),
            "decoded input"
        );
        conform(raw, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_markup_regardless_of_extension() {
        let html = b"\n  <!DOCTYPE html>\n<html><body><table></table></body></html>";
        assert_eq!(detect_format(html, Path::new("orders.xls")), InputFormat::Html);
        assert_eq!(
            detect_format(b"<HTML>\n<table>", Path::new("orders")),
            InputFormat::Html
        );
        assert_eq!(
            detect_format("\u{feff}<head>".as_bytes(), Path::new("x.xlsx")),
            InputFormat::Html
        );
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_format(b"a,b,c\n", Path::new("x.CSV")), InputFormat::Csv);
        assert_eq!(
            detect_format(b"PK\x03\x04rest", Path::new("x.xltx")),
            InputFormat::Workbook
        );
        assert_eq!(detect_format(b"", Path::new("noext")), InputFormat::Workbook);
    }

    #[test]
    fn test_unreadable_file() {
        let err = ParserFactory::new()
            .parse(Path::new("/definitely/not/here.xlsx"), &Config::default())
            .unwrap_err();
        assert_eq!(err.kind(), "io_error");
    }
}
