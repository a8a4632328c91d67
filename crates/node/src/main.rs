//! Stader node-operator daemon CLI.

use alloy_primitives::Address;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use stader_node::{
    render_network, render_status, Node, NodeConfig, DEFAULT_HOME_DIR, STADERD_HOME_ENV,
};
use stader_state::NetworkSnapshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Stader node-operator state daemon
#[derive(Parser)]
#[command(name = "staderd")]
#[command(version)]
#[command(about = "Stader node-operator state daemon", long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Directory for config and data
    #[arg(long, global = true, default_value_os_t = default_home_dir())]
    home: PathBuf,

    /// The logging level (trace|debug|info|warn|error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// The logging format (json|plain)
    #[arg(long, global = true, default_value = "plain")]
    log_format: String,

    /// Disable colored logs
    #[arg(long, global = true, default_value = "false")]
    log_no_color: bool,

    /// Print out full error chain on errors
    #[arg(long, global = true, default_value = "false")]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Execution client JSON-RPC endpoint
        #[arg(long)]
        execution_rpc_url: Option<String>,

        /// Beacon node REST endpoint
        #[arg(long)]
        beacon_url: Option<String>,

        /// Operator address to report on
        #[arg(long)]
        node_address: Option<Address>,

        /// Overwrite existing configuration
        #[arg(long, default_value = "false")]
        overwrite: bool,
    },

    /// Run the snapshot refresher and the metrics endpoint
    Start {
        /// Path to configuration file (overrides --home)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the operator's status from the running daemon, or a fresh build
    Status {
        /// Beacon slot to build at instead of reading the daemon's snapshot
        #[arg(long)]
        slot: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print network-wide figures from the running daemon, or a fresh build
    Network {
        /// Beacon slot to build at instead of reading the daemon's snapshot
        #[arg(long)]
        slot: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Utilities for managing application configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print the application binary version information
    Version {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,
}

/// Returns the default home directory for staderd.
///
/// Resolution order:
/// 1. `STADERD_HOME` environment variable (if set)
/// 2. `~/.staderd` (default)
fn default_home_dir() -> PathBuf {
    if let Ok(home) = std::env::var(STADERD_HOME_ENV) {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_HOME_DIR)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, &cli.log_format, cli.log_no_color);

    let result = match cli.command {
        Commands::Init {
            execution_rpc_url,
            beacon_url,
            node_address,
            overwrite,
        } => cmd_init(
            &cli.home,
            execution_rpc_url,
            beacon_url,
            node_address,
            overwrite,
        ),

        Commands::Start { config } => {
            let config_path = config.unwrap_or_else(|| NodeConfig::config_path(&cli.home));
            cmd_start(&config_path).await
        }

        Commands::Status { slot, output } => cmd_status(&cli.home, slot, output).await,

        Commands::Network { slot, output } => cmd_network(&cli.home, slot, output).await,

        Commands::Config { command } => cmd_config(&cli.home, command),

        Commands::Version { output } => cmd_version(output),
    };

    if let Err(e) = &result {
        if cli.trace {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing; `RUST_LOG` takes precedence over `--log-level`.
fn init_tracing(log_level: &str, log_format: &str, no_color: bool) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color);

    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn cmd_init(
    home: &Path,
    execution_rpc_url: Option<String>,
    beacon_url: Option<String>,
    node_address: Option<Address>,
    overwrite: bool,
) -> Result<()> {
    let config_path = NodeConfig::config_path(home);
    if config_path.exists() && !overwrite {
        bail!(
            "Configuration already exists at {}. Use --overwrite to replace.",
            config_path.display()
        );
    }

    let mut config = NodeConfig::default();
    if let Some(url) = execution_rpc_url {
        config.execution_rpc_url = url;
    }
    if let Some(url) = beacon_url {
        config.beacon_url = url;
    }
    if let Some(address) = node_address {
        config.node_address = address;
    }
    config.save(&config_path)?;

    println!("Successfully initialized node configuration");
    println!();
    println!("  Home:         {}", home.display());
    println!("  Config:       {}", config_path.display());
    println!("  Node address: {}", config.node_address);
    println!();
    let unset = config.contracts.unset();
    if !unset.is_empty() {
        println!("Fill in the contract addresses before starting:");
        for name in unset {
            println!("  contracts.{}", name);
        }
        println!();
    }
    println!("To start the node:");
    println!("  staderd start --home {}", home.display());

    Ok(())
}

async fn cmd_start(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        bail!(
            "Configuration file not found: {}\nRun 'staderd init' first to create configuration.",
            config_path.display()
        );
    }

    info!("Loading configuration from {}", config_path.display());
    let config = NodeConfig::load(config_path)?;

    Node::new(config)?.run().await
}

async fn one_shot(home: &Path, slot: Option<u64>) -> Result<Arc<NetworkSnapshot>> {
    let config = NodeConfig::load_from_home(home)?;
    Node::new(config)?.read_snapshot(slot).await
}

async fn cmd_status(home: &Path, slot: Option<u64>, output: OutputFormat) -> Result<()> {
    let snapshot = one_shot(home, slot).await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*snapshot)?),
        OutputFormat::Text => print!("{}", render_status(&snapshot)),
    }
    Ok(())
}

async fn cmd_network(home: &Path, slot: Option<u64>, output: OutputFormat) -> Result<()> {
    let snapshot = one_shot(home, slot).await?;

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "beacon_slot": snapshot.beacon_slot,
                "execution_block": snapshot.execution_block,
                "execution_block_hash": snapshot.execution_block_hash,
                "consistency": snapshot.consistency,
                "reward_params": snapshot.reward_params,
                "rewards_threshold": snapshot.rewards_threshold,
                "network": snapshot.network,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print!("{}", render_network(&snapshot)),
    }
    Ok(())
}

fn cmd_config(home: &Path, command: ConfigCommands) -> Result<()> {
    let config_path = NodeConfig::config_path(home);

    match command {
        ConfigCommands::Show => {
            if !config_path.exists() {
                bail!(
                    "Configuration not found at {}. Run 'staderd init' first.",
                    config_path.display()
                );
            }
            let data = std::fs::read_to_string(&config_path)?;
            print!("{}", data);
        }
        ConfigCommands::Path => println!("{}", config_path.display()),
    }

    Ok(())
}

#[derive(Serialize)]
struct VersionInfo {
    name: String,
    version: String,
    git_commit: String,
    rust_version: String,
}

impl VersionInfo {
    fn new() -> Self {
        Self {
            name: "staderd".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
            rust_version: option_env!("CARGO_PKG_RUST_VERSION")
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

fn cmd_version(output: OutputFormat) -> Result<()> {
    let version_info = VersionInfo::new();

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&version_info)?),
        OutputFormat::Text => {
            println!("{}: {}", version_info.name, version_info.version);
            println!("git commit: {}", version_info.git_commit);
            println!("rust version: {}", version_info.rust_version);
        }
    }

    Ok(())
}
