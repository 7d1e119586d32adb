//! Input selection: the newest export in a directory, and the upload gate

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::{glob_with, MatchOptions, Pattern};
use tracing::{debug, info, warn};

use crate::error::{io_err, Result, SyncError};

/// Extensions picked up when scanning a directory for the newest export
pub const SCAN_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "xltx"];

/// Extensions the upload gate accepts
pub const UPLOAD_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "xltx", "htm", "html"];

/// Find the most recently created workbook in `dir`.
///
/// Creation time is used where the platform reports it, modification time
/// otherwise. Ties go to the lexicographically greater path.
pub fn find_latest_input(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(SyncError::NoInputFound(dir.to_path_buf()));
    }

    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let base = Pattern::escape(&dir.display().to_string());

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for ext in SCAN_EXTENSIONS {
        let pattern = format!("{}/*.{}", base, ext);
        let entries = glob_with(&pattern, options)
            .map_err(|e| SyncError::Config(format!("bad input pattern {}: {}", pattern, e)))?;
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
            let stamp = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            debug!(path = %path.display(), "input candidate");
            candidates.push((stamp, path));
        }
    }

    let latest = candidates
        .into_iter()
        .max()
        .map(|(_, path)| path)
        .ok_or_else(|| SyncError::NoInputFound(dir.to_path_buf()))?;
    info!(path = %latest.display(), "selected newest input");
    Ok(latest)
}

/// Extension and size checks applied to uploaded files
#[derive(Debug, Clone)]
pub struct UploadGate {
    allowed: Vec<String>,
    max_bytes: u64,
}

impl UploadGate {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            allowed: UPLOAD_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_bytes,
        }
    }

    /// Accept or reject a file
    pub fn check(&self, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.allowed.iter().any(|a| *a == ext) {
            return Err(SyncError::UploadRejected(format!(
                "{}: unsupported file type (allowed: {})",
                path.display(),
                self.allowed.join(", ")
            )));
        }

        let meta = std::fs::metadata(path).map_err(|e| io_err(path, e))?;
        if !meta.is_file() {
            return Err(SyncError::UploadRejected(format!(
                "{}: not a regular file",
                path.display()
            )));
        }
        if meta.len() > self.max_bytes {
            return Err(SyncError::UploadRejected(format!(
                "{}: {} bytes exceeds the {} byte limit",
                path.display(),
                meta.len(),
                self.max_bytes
            )));
        }
        Ok(())
    }
}
