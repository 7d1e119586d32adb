//! HTML table export parser

use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use crate::config::Config;
use crate::error::{io_err, Result};

use super::normalize::{RawRow, RawTable};
use super::Parser;

/// Parser for markup documents; the first `<table>` is used and its first
/// row is the header.
pub struct HtmlParser;

impl Parser for HtmlParser {
    fn decode(&self, bytes: &[u8], path: &Path, _config: &Config) -> Result<RawTable> {
        let text = String::from_utf8_lossy(bytes);
        let document = Html::parse_document(&text);

        let table_sel = selector("table", path)?;
        let row_sel = selector("tr", path)?;
        let cell_sel = selector("th, td", path)?;

        let table = document
            .select(&table_sel)
            .next()
            .ok_or_else(|| io_err(path, "no <table> found in document"))?;

        let mut rows_iter = table.select(&row_sel);
        let headers = match rows_iter.next() {
            Some(header_row) => header_row
                .select(&cell_sel)
                .map(|cell| cell_text(cell).unwrap_or_default())
                .collect(),
            None => return Ok(RawTable::default()),
        };

        let rows = rows_iter
            .enumerate()
            .map(|(line_num, row)| {
                let cells = row.select(&cell_sel).map(cell_text).collect();
                RawRow::new(cells, line_num + 2)
            })
            .collect();

        Ok(RawTable { headers, rows })
    }

    fn name(&self) -> &'static str {
        "html"
    }
}

fn selector(css: &str, path: &Path) -> Result<Selector> {
    Selector::parse(css).map_err(|e| io_err(path, format!("invalid selector {}: {:?}", css, e)))
}

/// Whitespace-collapsed text of a cell
fn cell_text(cell: ElementRef<'_>) -> Option<String> {
    let text = cell.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
