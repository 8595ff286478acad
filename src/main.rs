//! Momentum Signals CLI
//!
//! # Commands
//!
//! - `scan`: scan unscanned published documents and record signals
//! - `query`: list recorded signals in a trailing window, with per-category counts
//! - `counts`: per-category counts only
//! - `show`: one recorded signal by id
//! - `import`: load documents from a JSON array file into the document store
//! - `detect`: dry-run detection on a text or stored document (nothing is written)
//!
//! Output is JSON on stdout; logs go to stderr. Rejected input exits with
//! status 2, any other failure with 1.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use momentum_lib::db::documents::NewDocument;
use momentum_lib::db::{DbDocument, MomentumDb};
use momentum_lib::error::ErrorResponse;
use momentum_lib::signals::extract::extract_signals;
use momentum_lib::signals::query::{QueryService, SignalQuery};
use momentum_lib::signals::scan::ScanOrchestrator;
use momentum_lib::state;
use momentum_lib::types::Config;
use momentum_lib::SignalError;

/// Momentum signal extraction for industry news
#[derive(Parser)]
#[command(name = "momentum")]
#[command(version)]
#[command(about = "Detect, score and query momentum signals in news documents")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Database file (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan unscanned documents and record signals
    Scan {
        /// Maximum documents to examine in this pass
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List recorded signals in a trailing window
    Query(QueryArgs),
    /// Per-category signal counts in a trailing window
    Counts {
        /// Window size in days
        #[arg(long)]
        days: Option<i64>,
    },
    /// Show one recorded signal
    Show {
        /// Signal id (`sig-...`)
        id: String,
    },
    /// Import documents from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Run detection without writing anything
    Detect {
        /// Free text to scan
        #[arg(long, conflicts_with = "document", required_unless_present = "document")]
        text: Option<String>,
        /// Id of a stored document to scan
        #[arg(long)]
        document: Option<String>,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Category filter (hiring, spinout, fund_launch, fund_close, deal,
    /// expansion, personnel_change, partnership, award)
    #[arg(long)]
    category: Option<String>,
    /// Window size in days
    #[arg(long)]
    days: Option<i64>,
    /// Maximum signals returned
    #[arg(long)]
    limit: Option<usize>,
}

fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), SignalError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| SignalError::Config(format!("Failed to serialize output: {}", e)))?;
    println!("{out}");
    Ok(())
}

fn db_path(cli_db: Option<PathBuf>, config: &Config) -> Result<PathBuf, SignalError> {
    match cli_db {
        Some(p) => Ok(p),
        None => state::resolve_db_path(config),
    }
}

/// Open read-only when the database already exists so queries never block a scan.
fn open_for_read(path: PathBuf) -> Result<MomentumDb, SignalError> {
    if path.exists() {
        Ok(MomentumDb::open_readonly_at(&path)?)
    } else {
        Ok(MomentumDb::open_at(path)?)
    }
}

fn run(cli: Cli) -> Result<(), SignalError> {
    let config = state::load_config()?;
    let path = db_path(cli.db, &config)?;

    match cli.command {
        Commands::Scan { limit } => {
            let db = MomentumDb::open_at(path)?;
            let batch = limit.unwrap_or(config.scan_batch_size);
            let report = ScanOrchestrator::new(&db).run_scan(batch)?;
            print_json(&report)
        }
        Commands::Query(args) => {
            let db = open_for_read(path)?;
            let query = SignalQuery {
                category: args.category,
                window_days: Some(args.days.unwrap_or(config.default_window_days)),
                limit: Some(args.limit.unwrap_or(config.query_limit)),
            };
            let result = QueryService::new(&db).signals_with_counts(&query)?;
            print_json(&result)
        }
        Commands::Counts { days } => {
            let db = open_for_read(path)?;
            let counts = QueryService::new(&db)
                .counts(Some(days.unwrap_or(config.default_window_days)))?;
            print_json(&counts)
        }
        Commands::Show { id } => {
            let db = open_for_read(path)?;
            let signal = QueryService::new(&db).signal(&id)?;
            print_json(&signal)
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file).map_err(|e| {
                SignalError::Config(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let docs: Vec<NewDocument> = serde_json::from_str(&content).map_err(|e| {
                SignalError::Config(format!("Failed to parse {}: {}", file.display(), e))
            })?;
            let db = MomentumDb::open_at(path)?;
            let imported = db.import_documents(&docs)?;
            tracing::info!(imported, file = %file.display(), "Imported documents");
            print_json(&serde_json::json!({ "imported": imported }))
        }
        Commands::Detect { text, document } => {
            let doc = match (text, document) {
                (Some(text), _) => DbDocument {
                    id: "adhoc".to_string(),
                    title: None,
                    excerpt: None,
                    body: Some(text),
                    published_at: None,
                    created_at: String::new(),
                    status: "published".to_string(),
                },
                (None, Some(id)) => {
                    let db = open_for_read(path)?;
                    db.get_document(&id)?
                        .ok_or_else(|| SignalError::NotFound(format!("document {}", id)))?
                }
                (None, None) => {
                    return Err(SignalError::Config("Pass --text or --document".to_string()))
                }
            };
            let signals = extract_signals(&doc, chrono::Utc::now());
            print_json(&signals)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            match serde_json::to_string(&ErrorResponse::from(&e)) {
                Ok(body) => eprintln!("{body}"),
                Err(_) => eprintln!("{e}"),
            }
            ExitCode::from(e.exit_code())
        }
    }
}
