//! ordersync - publish order exports to a Google Sheet

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use ordersync::config::{Config, OutputFormat};
use ordersync::pipeline::Pipeline;
use ordersync::remote::auth::CredentialChain;
use ordersync::remote::GoogleSheetStore;
use ordersync::report::{render_status_to_stdout, render_to_stdout};
use ordersync::SyncError;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Reconcile order exports (Excel, HTML, CSV) against a published Google Sheet
#[derive(Parser, Debug)]
#[command(name = "ordersync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Spreadsheet holding the published orders
    #[arg(long, global = true, env = "GOOGLE_SPREADSHEET_ID", hide_env_values = true)]
    spreadsheet_id: Option<String>,

    /// Worksheet inside the spreadsheet
    #[arg(long, global = true, env = "GOOGLE_SHEET_NAME")]
    sheet_name: Option<String>,

    /// Directory for the run-state file
    #[arg(long, global = true, env = "ORDERSYNC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile an export and republish the sheet
    Run {
        /// Export to process (default: newest workbook in --dir)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Directory scanned for the newest export
        #[arg(long, env = "ORDERSYNC_INPUT_DIR")]
        dir: Option<PathBuf>,

        /// Workbook sheet to read (first sheet if unset)
        #[arg(long, env = "ORDERSYNC_SHEET")]
        sheet: Option<String>,

        /// Compute everything but do not write the sheet or the run state
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliOutputFormat,
    },

    /// Check an uploaded export, then process it
    Upload {
        /// Uploaded file
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliOutputFormat,
    },

    /// Report remote connectivity and the published order count
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliOutputFormat,
    },

    /// Liveness check
    Health,
}

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<SyncError>() {
                Some(SyncError::Config(_)) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Health = cli.command {
        println!(
            "{}",
            serde_json::json!({ "status": "healthy", "service": "ordersync" })
        );
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(id) = cli.spreadsheet_id {
        config = config.with_spreadsheet_id(id);
    }
    if let Some(name) = cli.sheet_name {
        config = config.with_sheet_name(name);
    }
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command {
        Command::Run {
            file,
            dir,
            sheet,
            dry_run,
            format,
        } => {
            if let Some(dir) = dir {
                config = config.with_input_dir(dir);
            }
            if let Some(sheet) = sheet {
                config = config.with_input_sheet(sheet);
            }
            let config = config.with_dry_run(dry_run).with_output_format(format.into());
            let pipeline = connect(config)?;
            let summary = pipeline.run(file.as_deref()).context("sync run failed")?;
            render_to_stdout(&summary, pipeline.config().output_format)?;
        }
        Command::Upload { path, format } => {
            let config = config.with_output_format(format.into());
            let pipeline = connect(config)?;
            let summary = pipeline
                .upload(&path)
                .with_context(|| format!("failed to process upload {}", path.display()))?;
            render_to_stdout(&summary, pipeline.config().output_format)?;
        }
        Command::Status { format } => {
            let pipeline = connect(config)?;
            render_status_to_stdout(&pipeline.status(), format.into())?;
        }
        Command::Health => {}
    }

    Ok(())
}

fn connect(config: Config) -> Result<Pipeline<GoogleSheetStore>> {
    let store = GoogleSheetStore::new(&config, CredentialChain::from_env())?;
    Ok(Pipeline::new(config, store))
}
