//! semisupply CLI: drive the supplier ingestion pipeline in-process.
//!
//! Usage:
//!   semisupply [--db path] [--config path] collect
//!   semisupply add <record.json> [--source id]
//!   semisupply import <records.json> [--source id]
//!   semisupply sources
//!   semisupply list [--limit N]

use clap::{Parser, Subcommand};
use semisupply::{
    CollectionConfig, CollectionService, Completion, IngestOutcome, OpenStore, RawRecord,
    ReqwestFetcher, RunState, SqliteStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "semisupply",
    version,
    about = "Collect and deduplicate semiconductor supplier records"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a collection over all configured sources and print the report
    Collect,
    /// Ingest one raw record from a JSON file
    Add {
        /// JSON file holding one record object
        file: PathBuf,
        /// Source id recorded with the supplier
        #[arg(long, default_value = "manual")]
        source: String,
    },
    /// Ingest an array of raw records from a JSON file
    Import {
        /// JSON file holding an array of record objects
        file: PathBuf,
        #[arg(long, default_value = "manual")]
        source: String,
    },
    /// List configured sources
    Sources,
    /// List stored suppliers
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Get the default database path (~/.local/share/semisupply/suppliers.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("semisupply").join("suppliers.db")
}

fn open_service(db: Option<PathBuf>, config: Option<&Path>) -> Result<CollectionService, String> {
    let config = CollectionConfig::load_or_default(config)
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    let fetcher = ReqwestFetcher::new(&config.crawler)
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
    CollectionService::from_config(&config, Arc::new(fetcher), Arc::new(store))
        .map_err(|e| format!("Invalid configuration: {}", e))
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("'{}' is not valid JSON: {}", path.display(), e))
}

fn cmd_collect(service: &CollectionService) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let state = rt.block_on(async {
        service.start_collection();
        service.wait_idle().await
    });
    let RunState::Completed(report) = state else {
        eprintln!("Error: collection did not complete");
        return 1;
    };

    println!("Run {} ({:?})", report.run_id, report.completion());
    println!("{:<24}  {:>9}  {:>6}  {}", "SOURCE", "COLLECTED", "FAILED", "ERROR");
    println!("{}", "-".repeat(72));
    for (id, source) in &report.fetch.per_source {
        println!(
            "{:<24}  {:>9}  {:>6}  {}",
            id,
            source.collected,
            source.failed,
            source.error.as_deref().unwrap_or("")
        );
    }
    println!();
    println!(
        "collected {}, inserted {}, duplicates {}, rejected {}, irrelevant {}, storage errors {}",
        report.fetch.total_collected,
        report.inserted,
        report.duplicates,
        report.rejected,
        report.irrelevant,
        report.storage_errors
    );
    if report.completion() == Completion::NoSourcesAttempted {
        println!("No sources configured.");
    }
    0
}

fn ingest(
    service: &CollectionService,
    source: &str,
    value: serde_json::Value,
) -> Result<IngestOutcome, String> {
    let raw = RawRecord::from_json(source, chrono::Utc::now(), value).map_err(|e| e.to_string())?;
    service.ingest_manual(raw).map_err(|e| e.to_string())
}

fn describe_outcome(outcome: &IngestOutcome) -> String {
    match outcome {
        IngestOutcome::Inserted(id) => format!("inserted ({})", id),
        IngestOutcome::Skipped => "skipped (already stored)".to_string(),
        IngestOutcome::Invalid(reason) => format!("invalid ({:?})", reason),
    }
}

fn cmd_add(service: &CollectionService, file: &Path, source: &str) -> i32 {
    let result = read_json(file).and_then(|value| ingest(service, source, value));
    match result {
        Ok(outcome) => {
            println!("{}", describe_outcome(&outcome));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_import(service: &CollectionService, file: &Path, source: &str) -> i32 {
    let items = match read_json(file) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(_) => {
            eprintln!("Error: '{}' must contain a JSON array", file.display());
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let (mut inserted, mut skipped, mut invalid, mut failed) = (0, 0, 0, 0);
    for (i, item) in items.into_iter().enumerate() {
        match ingest(service, source, item) {
            Ok(IngestOutcome::Inserted(_)) => inserted += 1,
            Ok(IngestOutcome::Skipped) => skipped += 1,
            Ok(IngestOutcome::Invalid(_)) => invalid += 1,
            Err(e) => {
                eprintln!("record {}: {}", i, e);
                failed += 1;
            }
        }
    }
    println!(
        "inserted {}, skipped {}, invalid {}, failed {}",
        inserted, skipped, invalid, failed
    );
    if failed > 0 {
        1
    } else {
        0
    }
}

fn cmd_sources(service: &CollectionService) -> i32 {
    let sources = service.sources();
    if sources.is_empty() {
        println!("No sources configured.");
        return 0;
    }
    println!("{:<20}  {:<22}  {:<24}  {}", "ID", "KIND", "NAME", "DESCRIPTION");
    println!("{}", "-".repeat(96));
    for s in sources {
        println!(
            "{:<20}  {:<22}  {:<24}  {}",
            s.id,
            s.kind.as_str(),
            s.display_name,
            s.description
        );
    }
    0
}

fn cmd_list(service: &CollectionService, limit: Option<usize>) -> i32 {
    let suppliers = match service.store().list(limit) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if suppliers.is_empty() {
        println!("No suppliers stored.");
        return 0;
    }
    println!("{:<36}  {:<32}  {:<10}  {:<14}  {:<6}", "ID", "NAME", "COUNTRY", "TYPE", "SCALE");
    println!("{}", "-".repeat(108));
    for s in suppliers {
        println!(
            "{:<36}  {:<32}  {:<10}  {:<14}  {:<6}",
            s.id.to_string(),
            s.record.company_name,
            s.record.country,
            s.record.supplier_type.as_str(),
            s.record.scale.as_str()
        );
    }
    0
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = match open_service(cli.db, cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Collect => cmd_collect(&service),
        Commands::Add { file, source } => cmd_add(&service, &file, &source),
        Commands::Import { file, source } => cmd_import(&service, &file, &source),
        Commands::Sources => cmd_sources(&service),
        Commands::List { limit } => cmd_list(&service, limit),
    };
    std::process::exit(code);
}
