//! Conform decoded tables to the order schema

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::model::{OrderRecord, RowSet, FIELD_COUNT};

/// A decoded but not yet normalized table
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Header cells of the first row
    pub headers: Vec<String>,
    /// Data rows
    pub rows: Vec<RawRow>,
}

/// One decoded data row
#[derive(Debug, Clone)]
pub struct RawRow {
    pub cells: Vec<Option<String>>,
    /// Line/row number in the source (1-indexed)
    pub source_line: usize,
}

impl RawRow {
    pub fn new(cells: Vec<Option<String>>, source_line: usize) -> Self {
        Self { cells, source_line }
    }

    fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true))
    }
}

/// A row excluded from the row set because it was too short
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarantinedRow {
    pub source_line: usize,
    pub cell_count: usize,
}

/// What happened while conforming a table
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    /// Columns found in the header
    pub source_columns: usize,
    /// Columns dropped beyond the schema width
    pub dropped_columns: usize,
    /// Fully blank rows skipped
    pub blank_rows: usize,
    /// Rows rejected for having fewer cells than the schema
    pub quarantined: Vec<QuarantinedRow>,
}

/// Result of parsing one input file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub rows: RowSet,
    pub report: ParseReport,
}

/// Map a raw table positionally onto the schema.
///
/// Fails with [`SyncError::SchemaMismatch`] if the header is narrower than
/// the schema. Columns past the schema width are dropped.
pub fn conform(raw: RawTable, path: &Path) -> Result<ParsedFile> {
    let found = raw.headers.len();
    if found < FIELD_COUNT {
        return Err(SyncError::SchemaMismatch {
            path: path.to_path_buf(),
            expected: FIELD_COUNT,
            found,
        });
    }

    let mut report = ParseReport {
        source_columns: found,
        dropped_columns: found - FIELD_COUNT,
        ..Default::default()
    };
    if report.dropped_columns > 0 {
        warn!(
            path = %path.display(),
            expected = FIELD_COUNT,
            found,
            "column count differs from schema, keeping the first {} columns",
            FIELD_COUNT
        );
    }

    let mut rows = RowSet::new();
    for row in raw.rows {
        if row.is_blank() {
            report.blank_rows += 1;
            continue;
        }
        if row.cells.len() < FIELD_COUNT {
            warn!(
                line = row.source_line,
                cells = row.cells.len(),
                "row has fewer cells than the schema, quarantined"
            );
            report.quarantined.push(QuarantinedRow {
                source_line: row.source_line,
                cell_count: row.cells.len(),
            });
            continue;
        }
        let record = OrderRecord::from_cells(&row.cells, row.source_line);
        if !rows.push(record) {
            debug!(line = row.source_line, "duplicate identity key in input");
        }
    }

    Ok(ParsedFile { rows, report })
}
