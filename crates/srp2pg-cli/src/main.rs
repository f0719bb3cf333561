//! srp2pg CLI - copy schema and data from SQL Server into PostgreSQL.

use clap::{Parser, ValueEnum};
use srp2pg::{Config, Orchestrator, TransferError, TransferOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Clone, Copy, ValueEnum)]
enum Verbosity {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "srp2pg")]
#[command(about = "Copy schema and data from SQL Server into PostgreSQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Run without making changes; print generated SQL to stdout
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Name of the table to operate on (default: all tables)
    #[arg(short, long)]
    table: Option<String>,

    /// Include data
    #[arg(short, long)]
    include_data: bool,

    /// Include only data -- no table definition
    #[arg(short = 'o', long)]
    data_only: bool,

    /// Log verbosity
    #[arg(long, value_enum, default_value = "info")]
    verbosity: Verbosity,

    /// Log format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), TransferError> {
    let cli = Cli::parse();

    setup_logging(cli.verbosity, cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let options = TransferOptions {
        dry_run: cli.dry_run,
        table: cli.table,
        include_data: cli.include_data,
        data_only: cli.data_only,
    };

    // Connectivity failures here are fatal: the source is always required,
    // the target whenever this is not a dry run.
    let orchestrator = Orchestrator::connect(config, options).await?;
    let report = orchestrator.run().await?;

    println!();
    println!("Transfer completed");
    println!(
        "  Tables: {}/{}",
        report.tables_total() - report.tables_failed(),
        report.tables_total()
    );
    println!("  Rows inserted: {}", report.rows_inserted());
    if report.rows_skipped() > 0 {
        println!("  Rows skipped: {}", report.rows_skipped());
    }
    if !report.failed_tables().is_empty() {
        println!("  Failed tables: {:?}", report.failed_tables());
    }

    Ok(())
}

fn setup_logging(verbosity: Verbosity, format: LogFormat) {
    let level = match verbosity {
        Verbosity::Debug => Level::DEBUG,
        Verbosity::Info => Level::INFO,
        Verbosity::Warn => Level::WARN,
        Verbosity::Error => Level::ERROR,
    };

    // Logs go to stderr so dry-run SQL on stdout stays pipeable.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
