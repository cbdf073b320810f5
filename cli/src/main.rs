//! Stashline CLI - Command Line Interface

use clap::{Parser, Subcommand};
use stashline_cli::{apply_increment, apply_patch, parse_document, Backends, Document};
use stashline_core::{
    StashlineResult, StorageConfig, StorageKey, StorageType, StoreConfig, DEFAULT_STORAGE_KEY,
};
use stashline_state::{CollectingReporter, StoreBuilder, StoreHandle, TokioScheduler};
use std::path::PathBuf;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stashline")]
#[command(about = "Stashline - persistent application state from the command line")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory, overrides the configuration file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Storage key of the store
    #[arg(short, long, default_value = DEFAULT_STORAGE_KEY)]
    key: String,

    /// Storage medium: localStorage or sessionStorage
    #[arg(short, long, default_value = "localStorage")]
    storage: StorageType,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored value
    Get,

    /// Replace the value (with sessionStorage, only for this run)
    Set {
        /// New value (JSON object)
        value: String,
    },

    /// Merge fields into the value
    Patch {
        /// Fields to merge (JSON object)
        value: String,
    },

    /// Increment a numeric field
    Incr {
        /// Field name
        field: String,

        /// Amount to add
        #[arg(long, default_value_t = 1)]
        by: i64,
    },

    /// Delete the stored slot (localStorage only)
    Remove,

    /// List stored keys (localStorage only)
    Keys,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StorageConfig::from_json_file(path)?,
        None => StorageConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.storage == StorageType::Session {
        warn!("sessionStorage only lives as long as this process");
    }

    let backends = Backends::open(&config)?;
    let store_config = StoreConfig::<Document>::default()
        .with_key(StorageKey::new(cli.key.clone()))
        .with_storage_type(cli.storage);

    match cli.command {
        Commands::Get => with_store(&backends, store_config, |_| Ok(())).await,

        Commands::Set { value } => {
            let document = parse_document(&value)?;
            with_store(&backends, store_config, move |store| {
                store.set(document);
                Ok(())
            })
            .await
        }

        Commands::Patch { value } => {
            with_store(&backends, store_config, |store| apply_patch(store, &value)).await
        }

        Commands::Incr { field, by } => {
            with_store(&backends, store_config, |store| apply_increment(store, &field, by)).await
        }

        Commands::Remove => {
            backends.remove(cli.storage, &store_config.storage_key)?;
            println!("Removed '{}' from {}", store_config.storage_key, cli.storage);
            Ok(())
        }

        Commands::Keys => {
            for key in backends.keys(cli.storage)? {
                println!("{}", key);
            }
            Ok(())
        }
    }
}

/// Open a store, wait for hydration, run `action` and print the result
async fn with_store<F>(
    backends: &Backends,
    config: StoreConfig<Document>,
    action: F,
) -> anyhow::Result<()>
where
    F: FnOnce(&StoreHandle<Document>) -> StashlineResult<()>,
{
    let env = backends.environment();
    let scheduler = TokioScheduler::current()?;
    let reporter = CollectingReporter::new();

    let store = StoreBuilder::new(config)
        .reporter(reporter.clone())
        .initialize(&env, &scheduler)?;
    store.wait_hydrated().await;

    action(&store)?;

    let failures = reporter.take();
    for failure in &failures {
        error!("{}", failure);
    }

    println!("{}", serde_json::to_string_pretty(&store.get_state())?);

    if !failures.is_empty() {
        anyhow::bail!(
            "{} storage failure(s) while handling '{}'",
            failures.len(),
            store.key()
        );
    }

    Ok(())
}
