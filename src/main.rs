use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payflow::application::runner::CommandRunner;
use payflow::application::service::LifecycleService;
use payflow::config::EngineConfig;
use payflow::domain::ports::LedgerStoreBox;
use payflow::infrastructure::in_memory::InMemoryLedgerStore;
use payflow::interfaces::csv::command_reader::CommandReader;
use payflow::interfaces::csv::item_writer::ItemWriter;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Write the audit log of every processed item as JSON lines to this file.
    #[arg(long)]
    audit_out: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineConfig,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = payflow::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                db_path = %path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryLedgerStore::new()))
        }
        None => Ok(Box::new(InMemoryLedgerStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let store = open_store(cli.db_path)?;
    let service = LifecycleService::from_config(store, &cli.engine).into_diagnostic()?;

    // Process commands
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut runner = CommandRunner::new(&service);
    let refused = runner.run(reader.commands()).await;
    if refused > 0 {
        tracing::info!(refused, "batch finished with refused commands");
    }

    let results = runner.results().await.into_diagnostic()?;

    if let Some(path) = cli.audit_out {
        let mut out = BufWriter::new(File::create(path).into_diagnostic()?);
        for (_, item) in &results {
            for entry in service.audit_log(item.id).await.into_diagnostic()? {
                serde_json::to_writer(&mut out, &entry).into_diagnostic()?;
                writeln!(out).into_diagnostic()?;
            }
        }
        out.flush().into_diagnostic()?;
    }

    // Output final state
    let stdout = io::stdout();
    let mut writer = ItemWriter::new(stdout.lock());
    writer
        .write_items(results.iter().map(|(label, item)| (label.as_str(), item)))
        .into_diagnostic()?;

    Ok(())
}
