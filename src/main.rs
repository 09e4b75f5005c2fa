use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use configuration::{init_tracing, load_config, override_store_backend, StoreBackend};
use core_types::{Calculation, OutputData};
use engine::{DataEngine, JsonFormatter, OutputFormatter};
use serde_json::Value;
use sources::HttpSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::{fingerprint, input_key, open_store, output_key, StoreReader};

mod table;

use table::TableFormatter;

/// The main entry point for the Tally calculation runner.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = match cli.store {
        Some(backend) => override_store_backend(config, backend).context("Invalid --store override")?,
        None => config,
    };
    // Held for the lifetime of the process so the file writer keeps flushing.
    let _log_guard = init_tracing(&config.logging)?;

    match cli.command {
        Commands::Run(args) => {
            let store = open_store(&config.store).await?;
            let source = Arc::new(HttpSource::new(&config.source)?);
            let calculation = read_calculation(&args.file)?;
            tracing::info!(file = %args.file.display(), url = source.url(), "Running calculation.");

            let rendered = match args.format {
                Format::Json => {
                    let engine = DataEngine::new(source, store, JsonFormatter::pretty(), &config.engine);
                    engine.run(&calculation).await??
                }
                Format::Compact => {
                    let engine = DataEngine::new(source, store, JsonFormatter::compact(), &config.engine);
                    engine.run(&calculation).await??
                }
                Format::Table => {
                    let engine = DataEngine::new(source, store, TableFormatter, &config.engine);
                    engine.run(&calculation).await?
                }
            };
            println!("{rendered}");
        }
        Commands::Fingerprint(args) => {
            let input = read_json(&args.file)?;
            match args.key {
                Some(key) => println!("{}", input_key(&key, &input)?),
                None => println!("{}", fingerprint(&input)?),
            }
        }
        Commands::Show(args) => {
            let store = open_store(&config.store).await?;
            let reader = StoreReader::new(Arc::clone(&store), config.engine.retry.clone());
            let key = output_key(&args.key);
            let value = reader
                .await_key(&key)
                .await?
                .with_context(|| format!("No stored output under '{key}'"))?;
            let output: OutputData = serde_json::from_value(value)
                .with_context(|| format!("Stored value under '{key}' is not a calculation output"))?;
            println!("{}", render(args.format, &output)?);
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Evaluates calculation trees over remote data and caches the results.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./tally.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured store backend.
    #[arg(long, global = true, value_enum)]
    store: Option<StoreBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a calculation read from a JSON file and print its result.
    Run(RunArgs),
    /// Print the fingerprint of a JSON input, or its raw-input cache key.
    Fingerprint(FingerprintArgs),
    /// Print the persisted output of an earlier calculation.
    Show(ShowArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// The calculation, as JSON.
    file: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Parser)]
struct FingerprintArgs {
    /// The data source input, as JSON.
    file: PathBuf,

    /// The calculation key; prints the full `{key}-{fingerprint}` cache key.
    #[arg(long)]
    key: Option<String>,
}

#[derive(Parser)]
struct ShowArgs {
    /// The key of the calculation whose output to show.
    key: String,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Pretty-printed JSON.
    Json,
    /// Single-line JSON.
    Compact,
    /// A terminal table.
    Table,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn render(format: Format, output: &OutputData) -> anyhow::Result<String> {
    Ok(match format {
        Format::Json => JsonFormatter::pretty().format(output)?,
        Format::Compact => JsonFormatter::compact().format(output)?,
        Format::Table => TableFormatter.format(output),
    })
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_calculation(path: &Path) -> anyhow::Result<Calculation> {
    let value = read_json(path)?;
    serde_json::from_value(value).with_context(|| format!("{} is not a valid calculation", path.display()))
}
