//! Remote tabular store holding the published orders

pub mod auth;
mod google;
mod memory;
mod snapshot;

use serde_json::Value;

use crate::error::Result;

pub use google::GoogleSheetStore;
pub use memory::MemoryStore;
pub use snapshot::{read_snapshot, snapshot_from_rows};

/// A single-sheet tabular store.
///
/// `list` returns every non-empty row as text, header row first.
pub trait SheetStore: Send + Sync {
    fn list(&self) -> Result<Vec<Vec<String>>>;

    fn clear(&self) -> Result<()>;

    fn append_header(&self, fields: &[String]) -> Result<()>;

    fn append_rows(&self, rows: &[Vec<Value>]) -> Result<()>;

    /// Replace the whole sheet with `header` followed by `rows`.
    ///
    /// The default clears and then writes everything in one append call.
    /// Stores with a cheaper overwrite should override this.
    fn replace(&self, header: &[String], rows: &[Vec<Value>]) -> Result<()> {
        self.clear()?;
        let mut batch = Vec::with_capacity(rows.len() + 1);
        batch.push(header.iter().cloned().map(Value::String).collect());
        batch.extend(rows.iter().cloned());
        self.append_rows(&batch)
    }
}

impl<S: SheetStore + ?Sized> SheetStore for Box<S> {
    fn list(&self) -> Result<Vec<Vec<String>>> {
        (**self).list()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn append_header(&self, fields: &[String]) -> Result<()> {
        (**self).append_header(fields)
    }

    fn append_rows(&self, rows: &[Vec<Value>]) -> Result<()> {
        (**self).append_rows(rows)
    }

    fn replace(&self, header: &[String], rows: &[Vec<Value>]) -> Result<()> {
        (**self).replace(header, rows)
    }
}

/// Render a sheet cell as text the way a spreadsheet displays it
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string().to_uppercase(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
