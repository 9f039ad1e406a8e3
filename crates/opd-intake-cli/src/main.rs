//! # opd-intake entry point
//!
//! Parses command-line arguments, loads configuration and dispatches to the
//! subcommand handlers.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use opd_intake_core::config::{self, ClinicConfig};
use opd_intake_core::Clinic;

use opd_intake_cli::entry::{run_add, run_new, AddArgs, NewArgs};
use opd_intake_cli::files::{run_paths, run_rebuild, run_workbook, PathsArgs, WorkbookArgs};
use opd_intake_cli::prompt::Prompter;
use opd_intake_cli::records::{run_list, run_report, ListArgs, Month, ReportArgs};

/// Clinic OPD intake: record visits, keep monthly workbooks, print visit slips.
#[derive(Parser, Debug)]
#[command(name = "opd-intake", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill in the intake form interactively.
    New(NewArgs),

    /// Save a visit from flags.
    Add(AddArgs),

    /// List saved visits.
    List(ListArgs),

    /// Write the printable report for a saved visit.
    Report(ReportArgs),

    /// Show the monthly workbook.
    Workbook(WorkbookArgs),

    /// Regenerate every monthly workbook from the database.
    RebuildWorkbooks,

    /// Show where the database, workbooks and reports are kept.
    Paths(PathsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_path) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };
    init_tracing(cli.verbose, &config);
    tracing::debug!("opd-intake v{} starting", config::APP_VERSION);

    match run(cli.command, &config, config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured filter.
fn init_tracing(verbose: bool, config: &ClinicConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&config.log_filter)
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<(ClinicConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((ClinicConfig::load(path)?, Some(path.to_path_buf())));
    }
    let path = config::default_config_path().filter(|p| p.exists());
    Ok((ClinicConfig::load_default()?, path))
}

fn run(command: Commands, config: &ClinicConfig, config_path: Option<&Path>) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();
    let mut stdout = io::stdout().lock();

    if let Commands::Paths(args) = &command {
        return run_paths(config, config_path, args, &mut stdout);
    }

    let mut clinic = Clinic::open(config)?;
    match command {
        Commands::New(args) => {
            let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
            run_new(&mut clinic, &args, &mut prompter, today).map(|_| ())
        }
        Commands::Add(args) => run_add(&mut clinic, &args, today).map(|_| ()),
        Commands::List(args) => run_list(&clinic, &args, &mut stdout),
        Commands::Report(args) => run_report(&clinic, &args),
        Commands::Workbook(args) => run_workbook(&clinic, &args, Month::of(today), &mut stdout),
        Commands::RebuildWorkbooks => run_rebuild(&clinic, &mut stdout),
        Commands::Paths(_) => Ok(()),
    }
}
