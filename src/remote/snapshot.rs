//! Reading the published snapshot back into order records

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{OrderRecord, RowSet, Schema, FIELD_COUNT};

use super::SheetStore;

/// Read the remote sheet and fingerprint it exactly like a fresh parse.
///
/// An empty sheet is an empty row set, not an error.
pub fn read_snapshot<S: SheetStore + ?Sized>(store: &S) -> Result<RowSet> {
    let rows = store.list()?;
    let snapshot = snapshot_from_rows(rows);
    info!(rows = snapshot.len(), "read remote snapshot");
    Ok(snapshot)
}

/// Map sheet rows onto the schema by header name.
///
/// The first row is the header. Schema fields missing from the header read
/// as blank; unknown headers are ignored. Fully blank rows are skipped.
pub fn snapshot_from_rows(rows: Vec<Vec<String>>) -> RowSet {
    let mut iter = rows.into_iter();
    let header = match iter.next() {
        Some(header) => header,
        None => return RowSet::new(),
    };

    // positions[field] = column in the sheet holding that field
    let mut positions: Vec<Option<usize>> = vec![None; FIELD_COUNT];
    for (col, name) in header.iter().enumerate() {
        if let Some(field) = Schema::index_of(name) {
            if positions[field].is_none() {
                positions[field] = Some(col);
            }
        }
    }
    let missing = positions.iter().filter(|p| p.is_none()).count();
    if missing > 0 {
        warn!(missing, "remote header lacks schema fields, reading them as blank");
    }

    let mut set = RowSet::new();
    for (line_num, row) in iter.enumerate() {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let cells: Vec<Option<String>> = positions
            .iter()
            .map(|pos| pos.and_then(|col| row.get(col).cloned()))
            .collect();
        set.push(OrderRecord::from_cells(&cells, line_num + 2));
    }
    set
}
