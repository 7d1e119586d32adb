//! Configuration handling for ordersync

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SyncError};

/// Default worksheet the orders are published to
pub const DEFAULT_SHEET_NAME: &str = "order";
/// Name of the run-state file inside the data directory
pub const STATE_FILE_NAME: &str = "last_processed.json";
/// Largest file the upload gate accepts (16 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Output format for run summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

/// Configuration for a sync run
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of the remote spreadsheet
    pub spreadsheet_id: String,
    /// Worksheet inside the spreadsheet holding the published orders
    pub sheet_name: String,
    /// Directory holding the run-state file
    pub data_dir: PathBuf,
    /// Directory scanned for the newest export when no file is given
    pub input_dir: PathBuf,
    /// For workbook inputs: which sheet to read (first sheet if unset)
    pub input_sheet: Option<String>,
    /// Timeout applied to each remote request
    pub request_timeout: Duration,
    /// Compute everything but skip the remote write and the run-state save
    pub dry_run: bool,
    /// Output format for the run summary
    pub output_format: OutputFormat,
    /// Upload gate size limit
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            data_dir: PathBuf::from("./data"),
            input_dir: PathBuf::from("."),
            input_sheet: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            dry_run: false,
            output_format: OutputFormat::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Build a config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Recognized keys: `GOOGLE_SPREADSHEET_ID`, `GOOGLE_SHEET_NAME`,
    /// `ORDERSYNC_DATA_DIR`, `ORDERSYNC_INPUT_DIR`, `ORDERSYNC_SHEET`,
    /// `ORDERSYNC_TIMEOUT_SECS`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(id) = get("GOOGLE_SPREADSHEET_ID") {
            config.spreadsheet_id = id;
        }
        if let Some(name) = get("GOOGLE_SHEET_NAME") {
            config.sheet_name = name;
        }
        if let Some(dir) = get("ORDERSYNC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("ORDERSYNC_INPUT_DIR") {
            config.input_dir = PathBuf::from(dir);
        }
        config.input_sheet = get("ORDERSYNC_SHEET");
        if let Some(secs) = get("ORDERSYNC_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                SyncError::Config(format!("ORDERSYNC_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Fail if the remote target is not addressable
    pub fn validate(&self) -> Result<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SyncError::Config(
                "GOOGLE_SPREADSHEET_ID is not set".to_string(),
            ));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(SyncError::Config("sheet name is empty".to_string()));
        }
        Ok(())
    }

    /// Path of the run-state JSON file
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE_NAME)
    }

    /// Set the remote spreadsheet
    pub fn with_spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.spreadsheet_id = id.into();
        self
    }

    /// Set the remote worksheet name
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the input directory
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Set the workbook sheet to read
    pub fn with_input_sheet(mut self, name: String) -> Self {
        self.input_sheet = Some(name);
        self
    }

    /// Enable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set upload size limit
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
