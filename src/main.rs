//! animal-ingest: partitioned, retrying ingestion of public animal-welfare
//! records into MongoDB.

mod commands;

use animal_ingest::{
    collectors::CollectorKind,
    config::{Config, LogFormat, LoggingConfig, DEFAULT_CONFIG_FILE},
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{init_config, print_months, run_collectors, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "animal-ingest")]
#[command(about = "Ingest abandoned-animal notices, registration statistics and shelters")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// No progress spinner or summary
    #[arg(short, long)]
    quiet: bool,

    /// Fetch and normalize, but keep documents in memory instead of MongoDB
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest abandoned-animal notices (region × sub-region × month)
    Abandonments,

    /// Ingest companion-animal registration statistics
    Registrations,

    /// Ingest the animal shelter directory
    Shelters,

    /// Run all three collectors in sequence
    All,

    /// Show how a date window is split into monthly partitions
    Months {
        /// First day (YYYYMMDD)
        start: String,
        /// Last day (YYYYMMDD)
        end: String,
    },

    /// Write a default configuration file
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive(verbose)));

    match logging.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let kinds: Vec<CollectorKind> = match cli.command {
        Commands::Abandonments => vec![CollectorKind::Abandonments],
        Commands::Registrations => vec![CollectorKind::Registrations],
        Commands::Shelters => vec![CollectorKind::Shelters],
        Commands::All => CollectorKind::ALL.to_vec(),
        Commands::Months { start, end } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            return print_months(&start, &end);
        }
        Commands::Init { path, force } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            return init_config(path, force).await;
        }
    };

    let config = Config::load_or_default(&cli.config)?;
    init_logging(&config.logging, cli.verbose)?;

    let options = RunOptions {
        dry_run: cli.dry_run,
        quiet: cli.quiet,
    };
    run_collectors(config, &kinds, options).await?;
    Ok(())
}
