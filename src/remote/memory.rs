//! In-process sheet store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::error::{Result, SyncError};

use super::{value_to_text, SheetStore};

/// Sheet store kept in memory. Used by tests and for local dry runs;
/// reads and writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Vec<Value>>>,
    calls: Mutex<Vec<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with text rows (header first)
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        let store = Self::new();
        *store.lock_rows() = rows
            .into_iter()
            .map(|r| r.into_iter().map(Value::String).collect())
            .collect();
        store
    }

    /// Make subsequent reads fail as unreachable
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw contents, header included
    pub fn snapshot(&self) -> Vec<Vec<Value>> {
        self.lock_rows().clone()
    }

    /// Names of the store operations performed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.to_string());
        }
    }

    fn lock_rows(&self) -> MutexGuard<'_, Vec<Vec<Value>>> {
        // A poisoned lock only means a panicking test; the data is still usable.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::WriteError("memory store: writes disabled".into()));
        }
        Ok(())
    }
}

impl SheetStore for MemoryStore {
    fn list(&self) -> Result<Vec<Vec<String>>> {
        self.record("list");
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("memory store: reads disabled".into()));
        }
        Ok(self
            .lock_rows()
            .iter()
            .map(|row| row.iter().map(value_to_text).collect())
            .collect())
    }

    fn clear(&self) -> Result<()> {
        self.record("clear");
        self.check_write()?;
        self.lock_rows().clear();
        Ok(())
    }

    fn append_header(&self, fields: &[String]) -> Result<()> {
        self.record("append_header");
        self.check_write()?;
        self.lock_rows()
            .push(fields.iter().cloned().map(Value::String).collect());
        Ok(())
    }

    fn append_rows(&self, rows: &[Vec<Value>]) -> Result<()> {
        self.record("append_rows");
        self.check_write()?;
        self.lock_rows().extend(rows.iter().cloned());
        Ok(())
    }
}
