//! ordo CLI
//!
//! Command-line interface for ordo - an ordered personal task list.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ordo_core::{
    AccessMode, Config, Direction, ListManager, LocalStore, RecordStore, RemoteConfig,
    RemoteStore, Subscription,
};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "ordo")]
#[command(about = "ordo - ordered personal task list with live sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new item at the end of the list
    Add {
        /// Item text
        content: Vec<String>,
    },
    /// List items in order
    #[command(alias = "ls")]
    List,
    /// Move an item one position up or down
    Move {
        /// Item ID (full UUID or prefix)
        id: String,
        /// Direction: up or down
        direction: String,
    },
    /// Delete an item
    #[command(alias = "rm")]
    Delete {
        /// Item ID (full UUID or prefix)
        id: String,
    },
    /// Watch the list and re-render on every change
    Watch,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show store location and item count
    Status,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, server_url, access_key)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need a store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    let store = open_store(&config)?;
    let (mut manager, mut sub) = load_manager(store).await?;

    match cli.command {
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Add { content } => {
            commands::item::add(&mut manager, content.join(" "), &output).await
        }
        Commands::List => commands::item::list(&manager, &output),
        Commands::Move { id, direction } => {
            let direction: Direction = direction.parse().map_err(|e: String| anyhow!(e))?;
            commands::item::move_item(&mut manager, id, direction, &output).await
        }
        Commands::Delete { id } => commands::item::delete(&mut manager, id, &output).await,
        Commands::Watch => commands::watch::watch(&mut manager, &mut sub, &output).await,
        Commands::Status => commands::status::show(&config, &manager, &output),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open the configured store: remote when a server URL is set, local
/// file store otherwise
fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match &config.server_url {
        Some(url) => {
            let access = AccessMode::from_parts(config.access_key.clone(), config.load_token()?)
                .ok_or_else(|| {
                    anyhow!(
                        "No credentials configured for {}. Set an access key with \
                         `ordo config set access_key <key>` or store a session token in {}",
                        url,
                        config.token_path().display()
                    )
                })?;
            Ok(Arc::new(RemoteStore::connect(RemoteConfig::new(url, access))))
        }
        None => {
            let store = LocalStore::open(config.items_path())
                .context("Failed to open local item store")?;
            Ok(Arc::new(store))
        }
    }
}

/// Subscribe and wait for the first authoritative snapshot
async fn load_manager(store: Arc<dyn RecordStore>) -> Result<(ListManager, Subscription)> {
    let mut sub = store.subscribe().await?;
    let mut manager = ListManager::new(store);

    let snapshot = sub
        .recv()
        .await
        .ok_or_else(|| anyhow!("Store closed before the first snapshot arrived"))?;
    manager.ingest_snapshot(snapshot);

    Ok((manager, sub))
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
