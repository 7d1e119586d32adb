//! Run orchestration: select input, parse, read remote, reconcile, publish,
//! record run state.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::error::Result;
use crate::input::{find_latest_input, UploadGate};
use crate::parser::{ParseReport, ParsedFile, ParserFactory};
use crate::publish::{PublishPlan, Publisher};
use crate::reconcile::{reconcile, Reconciliation, UpdatedOrder};
use crate::remote::{read_snapshot, SheetStore};
use crate::state::{self, RunState};

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectInput,
    Parse,
    ReadRemote,
    Reconcile,
    Publish,
    PersistRunState,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SelectInput => "select_input",
            Stage::Parse => "parse",
            Stage::ReadRemote => "read_remote",
            Stage::Reconcile => "reconcile",
            Stage::Publish => "publish",
            Stage::PersistRunState => "persist_run_state",
        };
        f.write_str(name)
    }
}

/// Per-class counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub fresh_rows: usize,
    pub remote_rows: usize,
    pub new: usize,
    pub updated: usize,
    pub retained: usize,
    pub dropped_unchanged: usize,
    pub quarantined: usize,
    pub duplicate_keys: usize,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_file: PathBuf,
    pub dry_run: bool,
    pub counts: SummaryCounts,
    /// Rows in the publish plan
    pub planned_rows: usize,
    /// Rows actually written (0 on a dry run)
    pub published_rows: usize,
    /// Keys present on both sides with identical content
    pub dropped_unchanged: Vec<String>,
    pub updated_orders: Vec<UpdatedOrder>,
    pub parse_report: ParseReport,
    pub state_saved: bool,
    pub finished_at: DateTime<Utc>,
}

/// Connectivity report for the remote sheet
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub connected: bool,
    pub sheet_name: String,
    pub total_orders: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<RunState>,
}

/// Drives one sync run against a sheet store
pub struct Pipeline<S: SheetStore> {
    config: Config,
    store: S,
    parsers: ParserFactory,
}

impl<S: SheetStore> Pipeline<S> {
    pub fn new(config: Config, store: S) -> Self {
        Self {
            config,
            store,
            parsers: ParserFactory::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every stage. `input` overrides newest-file discovery.
    ///
    /// Any stage error ends the run. A failed run-state save is only logged,
    /// since the sheet has already been published by then.
    #[instrument(skip_all, fields(dry_run = self.config.dry_run))]
    pub fn run(&self, input: Option<&Path>) -> Result<RunSummary> {
        let input_file = stage(Stage::SelectInput, || self.select_input(input))?;
        let parsed = stage(Stage::Parse, || self.parse(&input_file))?;
        let remote = stage(Stage::ReadRemote, || read_snapshot(&self.store))?;
        let reconciliation = stage(Stage::Reconcile, || Ok(reconcile(&parsed.rows, &remote)))?;
        if !reconciliation.has_changes() {
            info!("no new or updated orders");
        }
        let plan = PublishPlan::build(&reconciliation);

        let published_rows = if self.config.dry_run {
            info!(rows = plan.row_count(), "dry run, skipping publish");
            0
        } else {
            stage(Stage::Publish, || Publisher::new(&self.store).publish(&plan))?
        };

        let processed = reconciliation.stats.new + reconciliation.stats.updated;
        let state_saved = !self.config.dry_run && self.persist_state(&input_file, processed);

        let summary = summarize(input_file, &parsed, reconciliation, &plan, published_rows);
        info!(
            published = summary.published_rows,
            new = summary.counts.new,
            updated = summary.counts.updated,
            retained = summary.counts.retained,
            "run complete"
        );
        Ok(RunSummary {
            dry_run: self.config.dry_run,
            state_saved,
            ..summary
        })
    }

    /// Gate an uploaded file, then run on it
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn upload(&self, path: &Path) -> Result<RunSummary> {
        UploadGate::new(self.config.max_upload_bytes)
            .check(path)
            .map_err(|e| {
                warn!(error = %e, "upload rejected");
                e
            })?;
        self.run(Some(path))
    }

    /// Probe the remote sheet. Never fails; problems show up in the status.
    pub fn status(&self) -> StoreStatus {
        let last_run = match state::load(&self.config.state_file()) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "cannot read run state");
                None
            }
        };
        match read_snapshot(&self.store) {
            Ok(rows) => StoreStatus {
                connected: true,
                sheet_name: self.config.sheet_name.clone(),
                total_orders: rows.len(),
                message: None,
                last_run,
            },
            Err(e) => StoreStatus {
                connected: false,
                sheet_name: self.config.sheet_name.clone(),
                total_orders: 0,
                message: Some(e.to_string()),
                last_run,
            },
        }
    }

    fn select_input(&self, input: Option<&Path>) -> Result<PathBuf> {
        match input {
            Some(path) => Ok(path.to_path_buf()),
            None => find_latest_input(&self.config.input_dir),
        }
    }

    fn parse(&self, path: &Path) -> Result<ParsedFile> {
        let parsed = self.parsers.parse(path, &self.config)?;
        info!(
            path = %path.display(),
            records = parsed.rows.len(),
            quarantined = parsed.report.quarantined.len(),
            "parsed input"
        );
        Ok(parsed)
    }

    fn persist_state(&self, input_file: &Path, processed: usize) -> bool {
        let path = self.config.state_file();
        let run_state = RunState::new(input_file, processed);
        match state::save(&path, &run_state) {
            Ok(()) => true,
            Err(e) => {
                warn!(stage = %Stage::PersistRunState, error = %e, "run state not saved");
                false
            }
        }
    }
}

/// Run a stage, logging its failure with the stage name
fn stage<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|e| {
        error!(stage = %stage, kind = e.kind(), error = %e, "stage failed");
        e
    })
}

fn summarize(
    input_file: PathBuf,
    parsed: &ParsedFile,
    reconciliation: Reconciliation,
    plan: &PublishPlan,
    published_rows: usize,
) -> RunSummary {
    let stats = &reconciliation.stats;
    RunSummary {
        input_file,
        dry_run: false,
        counts: SummaryCounts {
            fresh_rows: stats.fresh_rows,
            remote_rows: stats.remote_rows,
            new: stats.new,
            updated: stats.updated,
            retained: stats.retained,
            dropped_unchanged: stats.unchanged,
            quarantined: parsed.report.quarantined.len(),
            duplicate_keys: stats.fresh_duplicates,
        },
        planned_rows: plan.row_count(),
        published_rows,
        dropped_unchanged: reconciliation.unchanged,
        updated_orders: reconciliation.updated_details,
        parse_report: parsed.report.clone(),
        state_saved: false,
        finished_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Schema;
    use crate::remote::MemoryStore;
    use tempfile::TempDir;

    fn csv_line(order_no: &str, date: &str, total: &str) -> String {
        let mut cells = vec![String::new(); 22];
        cells[0] = "shop".into();
        cells[1] = date.into();
        cells[2] = order_no.into();
        cells[3] = "M".into();
        cells[18] = total.into();
        cells.join(",")
    }

    fn write_csv(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
        let mut body = Schema::headers().join(",");
        for line in lines {
            body.push('\n');
            body.push_str(line);
        }
        body.push('\n');
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn pipeline(tmp: &TempDir, store: MemoryStore) -> Pipeline<MemoryStore> {
        let config = Config::default()
            .with_spreadsheet_id("test")
            .with_data_dir(tmp.path().join("data"))
            .with_input_dir(tmp.path());
        Pipeline::new(config, store)
    }

    #[test]
    fn test_run_publishes_and_saves_state() {
        let tmp = TempDir::new().unwrap();
        let input = write_csv(tmp.path(), "orders.csv", &[csv_line("A1", "2024-01-01", "100")]);
        let p = pipeline(&tmp, MemoryStore::new());

        let summary = p.run(Some(&input)).unwrap();
        assert_eq!(summary.counts.new, 1);
        assert_eq!(summary.published_rows, 1);
        assert!(summary.state_saved);
        assert_eq!(p.store().calls(), vec!["list", "clear", "append_rows"]);

        let saved = state::load(&p.config().state_file()).unwrap().unwrap();
        assert_eq!(saved.processed_count, 1);
    }

    #[test]
    fn test_saved_count_is_new_plus_updated() {
        let tmp = TempDir::new().unwrap();
        let input = write_csv(
            tmp.path(),
            "orders.csv",
            &[
                csv_line("A1", "2024-01-01", "100"),
                csv_line("A2", "2024-01-02", "200"),
                csv_line("A3", "2024-01-03", "300"),
            ],
        );
        let remote = {
            let mut rows = vec![Schema::headers()];
            for (no, date) in [("A1", "2024-01-01"), ("A2", "2024-01-02")] {
                rows.push(csv_line(no, date, "100").split(',').map(String::from).collect());
            }
            MemoryStore::with_rows(rows)
        };
        let p = pipeline(&tmp, remote);

        let summary = p.run(Some(&input)).unwrap();
        assert_eq!(summary.counts.new, 1);
        assert_eq!(summary.counts.updated, 1);
        assert_eq!(summary.counts.dropped_unchanged, 1);

        let saved = state::load(&p.config().state_file()).unwrap().unwrap();
        assert_eq!(saved.processed_count, 2);
    }

    #[test]
    fn test_dry_run_leaves_remote_and_state_alone() {
        let tmp = TempDir::new().unwrap();
        let input = write_csv(tmp.path(), "orders.csv", &[csv_line("A1", "2024-01-01", "100")]);
        let mut p = pipeline(&tmp, MemoryStore::new());
        p.config.dry_run = true;

        let summary = p.run(Some(&input)).unwrap();
        assert!(summary.dry_run);
        assert_eq!(summary.planned_rows, 1);
        assert_eq!(summary.published_rows, 0);
        assert_eq!(p.store().calls(), vec!["list"]);
        assert!(!p.config().state_file().exists());
    }

    #[test]
    fn test_remote_read_failure_aborts_before_publish() {
        let tmp = TempDir::new().unwrap();
        let input = write_csv(tmp.path(), "orders.csv", &[csv_line("A1", "2024-01-01", "100")]);
        let store = MemoryStore::new();
        store.set_fail_reads(true);
        let p = pipeline(&tmp, store);

        assert_eq!(p.run(Some(&input)).unwrap_err().kind(), "unavailable");
        assert_eq!(p.store().calls(), vec!["list"]);
        assert!(!p.config().state_file().exists());
    }

    #[test]
    fn test_no_input_found() {
        let tmp = TempDir::new().unwrap();
        let p = pipeline(&tmp, MemoryStore::new());
        assert_eq!(p.run(None).unwrap_err().kind(), "no_input_found");
        assert!(p.store().calls().is_empty());
    }

    #[test]
    fn test_state_save_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let input = write_csv(tmp.path(), "orders.csv", &[csv_line("A1", "2024-01-01", "100")]);
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a dir").unwrap();
        let mut p = pipeline(&tmp, MemoryStore::new());
        p.config.data_dir = blocker;

        let summary = p.run(Some(&input)).unwrap();
        assert_eq!(summary.published_rows, 1);
        assert!(!summary.state_saved);
    }

    #[test]
    fn test_upload_rejects_before_touching_remote() {
        let tmp = TempDir::new().unwrap();
        let input = write_csv(tmp.path(), "orders.csv", &[csv_line("A1", "2024-01-01", "100")]);
        let p = pipeline(&tmp, MemoryStore::new());
        assert_eq!(p.upload(&input).unwrap_err().kind(), "upload_rejected");
        assert!(p.store().calls().is_empty());
    }

    #[test]
    fn test_upload_size_limit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("orders.xlsx");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        let mut p = pipeline(&tmp, MemoryStore::new());
        p.config = p.config.clone().with_max_upload_bytes(32);

        assert_eq!(p.upload(&path).unwrap_err().kind(), "upload_rejected");
        assert!(p.store().calls().is_empty());
    }

    #[test]
    fn test_status() {
        let tmp = TempDir::new().unwrap();
        let mut rows = vec![Schema::headers()];
        let mut row = vec![String::new(); 22];
        row[2] = "A1".into();
        row[3] = "M".into();
        rows.push(row);
        let p = pipeline(&tmp, MemoryStore::with_rows(rows));

        let status = p.status();
        assert!(status.connected);
        assert_eq!(status.total_orders, 1);
        assert_eq!(status.sheet_name, "order");
        assert!(status.last_run.is_none());

        p.store().set_fail_reads(true);
        let status = p.status();
        assert!(!status.connected);
        assert!(status.message.is_some());
    }
}
