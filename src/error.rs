//! Error types for ordersync

use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

/// All errors a sync run can end in. Every variant is terminal for the run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Input file could not be opened or decoded.
    #[error("failed to read input {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// Input has fewer columns than the order schema.
    #[error("schema mismatch in {path}: expected at least {expected} columns, found {found}")]
    SchemaMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// Remote store unreachable or unauthenticated.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// Remote store rejected a write.
    #[error("remote write failed: {0}")]
    WriteError(String),

    /// No explicit file and nothing selectable in the input directory.
    #[error("no input file found in {}", .0.display())]
    NoInputFound(PathBuf),

    /// Upload gate refused the file.
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    /// Run-state file could not be read or written.
    #[error("run state error at {path}: {reason}")]
    State { path: PathBuf, reason: String },

    /// Missing or malformed configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Short machine-friendly name of the error kind, used in logs and JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Io { .. } => "io_error",
            SyncError::SchemaMismatch { .. } => "schema_mismatch",
            SyncError::Unavailable(_) => "unavailable",
            SyncError::WriteError(_) => "write_error",
            SyncError::NoInputFound(_) => "no_input_found",
            SyncError::UploadRejected(_) => "upload_rejected",
            SyncError::State { .. } => "state_error",
            SyncError::Config(_) => "config_error",
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, reason: impl Display) -> SyncError {
    SyncError::Io {
        path: path.into(),
        reason: reason.to_string(),
    }
}

/// Convenience constructor for [`SyncError::State`].
pub(crate) fn state_err(path: impl Into<PathBuf>, reason: impl Display) -> SyncError {
    SyncError::State {
        path: path.into(),
        reason: reason.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
