//! Run state: a record of the last successful run.
//!
//! Persisted as a small JSON document (see [`crate::config::STATE_FILE_NAME`]).
//! Writes go to `<path>.tmp` first and are renamed into place.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{state_err, Result};

/// What the last successful run processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Input file of the run
    pub last_processed_file: String,
    /// When the run finished
    pub last_processed_time: DateTime<Utc>,
    /// Records classified new or updated
    pub processed_count: usize,
}

impl RunState {
    pub fn new(file: &Path, processed_count: usize) -> Self {
        Self {
            last_processed_file: file.display().to_string(),
            last_processed_time: Utc::now(),
            processed_count,
        }
    }
}

/// Load the run state. `Ok(None)` if no run has been recorded yet.
pub fn load(path: &Path) -> Result<Option<RunState>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| state_err(path, e))?;
    let state = serde_json::from_str(&contents).map_err(|e| state_err(path, e))?;
    Ok(Some(state))
}

/// Save the run state atomically, creating the parent directory if needed
pub fn save(path: &Path, state: &RunState) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| state_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(state).map_err(|e| state_err(path, e))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| state_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| state_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load(&tmp.path().join("last_processed.json")).unwrap(), None);
    }

    #[test]
    fn test_save_creates_dir_and_loads_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("last_processed.json");
        let state = RunState::new(Path::new("/in/orders.xlsx"), 42);

        save(&path, &state).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.last_processed_file, "/in/orders.xlsx");
        assert_eq!(loaded.processed_count, 42);
    }

    #[test]
    fn test_corrupt_file_is_state_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last_processed.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load(&path).unwrap_err().kind(), "state_error");
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "file, not a dir").unwrap();
        let err = save(&blocker.join("last_processed.json"), &RunState::new(Path::new("x"), 0))
            .unwrap_err();
        assert_eq!(err.kind(), "state_error");
    }
}
