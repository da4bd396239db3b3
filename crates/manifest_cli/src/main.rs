//! `manifest` command line tool.
//!
//! # Responsibility
//! - Inspect, export, import and reset a planner database file without the
//!   desktop UI.
//! - Keep all persistence semantics inside `manifest_core`.

use clap::{Parser, Subcommand};
use manifest_core::db::{open_db, DbError};
use manifest_core::{default_log_level, init_logging, PlannerService, RepoError, SystemData};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

/// Inspect and maintain a Manifest planner database.
#[derive(Debug, Parser)]
#[command(name = "manifest", version)]
struct Args {
    /// Path to the SQLite database file
    #[arg(long, global = true, env = "MANIFEST_DB_PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "MANIFEST_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List stored years with dimension and task counts
    Years,
    /// Print one year as JSON
    Show { year: String },
    /// Write every year as JSON to stdout or a file
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all planning data with the contents of a JSON export
    Import { file: PathBuf },
    /// Delete one year; its tasks are kept
    DeleteYear { year: String },
    /// Delete one task and its month links
    DeleteTask { id: String },
    /// Wipe every table, profiles included
    Reset {
        /// Confirm the irreversible wipe
        #[arg(long)]
        yes: bool,
    },
    /// List profiles, marking the last used one
    Accounts,
}

#[derive(Debug)]
enum CliError {
    MissingDbPath,
    Db(DbError),
    Repo(RepoError),
    Io(io::Error),
    Json(serde_json::Error),
    Logging(String),
    ResetNotConfirmed,
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDbPath => {
                write!(f, "no database given; pass --db or set MANIFEST_DB_PATH")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid JSON: {err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::ResetNotConfirmed => write!(f, "reset wipes every table; rerun with --yes"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::MissingDbPath | Self::Logging(_) | Self::ResetNotConfirmed => None,
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(CliError::Logging)?;
    }

    let db_path = args.db.as_ref().ok_or(CliError::MissingDbPath)?;
    let conn = open_db(db_path)?;
    let service = PlannerService::new(&conn);
    execute(&args.command, &service, &mut io::stdout().lock())
}

fn execute(
    command: &Command,
    service: &PlannerService<'_>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Years => {
            for (year, annual) in service.get_all_annual_data()? {
                let tasks: usize = annual
                    .dimensions
                    .values()
                    .map(|dimension| dimension.task_count())
                    .sum();
                writeln!(
                    out,
                    "{year}\tdimensions={}\ttasks={tasks}\tscore={}",
                    annual.dimensions.len(),
                    annual.total_score
                )?;
            }
        }
        Command::Show { year } => match service.get_annual_data(year)? {
            Some(annual) => writeln!(out, "{}", serde_json::to_string_pretty(&annual)?)?,
            None => writeln!(out, "no data for year {year}")?,
        },
        Command::Export { out: None } => {
            let data = service.export_data()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&data)?)?;
        }
        Command::Export { out: Some(path) } => {
            let data = service.export_data()?;
            fs::write(path, serde_json::to_string_pretty(&data)?)?;
            writeln!(out, "exported {} year(s) to {}", data.len(), path.display())?;
        }
        Command::Import { file } => {
            let data: SystemData = serde_json::from_str(&fs::read_to_string(file)?)?;
            service.import_data(&data)?;
            writeln!(out, "imported {} year(s)", data.len())?;
        }
        Command::DeleteYear { year } => {
            service.delete_annual_data(year)?;
            writeln!(out, "deleted year {year}")?;
        }
        Command::DeleteTask { id } => {
            service.delete_task(id)?;
            writeln!(out, "deleted task {id}")?;
        }
        Command::Reset { yes: false } => return Err(CliError::ResetNotConfirmed),
        Command::Reset { yes: true } => {
            service.reset_all_data()?;
            writeln!(out, "all data removed")?;
        }
        Command::Accounts => {
            let last_used = service.get_last_used_account()?.map(|account| account.id);
            for account in service.get_accounts()? {
                let marker = if last_used.as_deref() == Some(account.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                writeln!(out, "{marker} {}\t{}", account.id, account.username)?;
            }
        }
    }
    Ok(())
}
