//! Node configuration
//!
//! The daemon reads a single `node.toml` from `{home}/config/`. Every field
//! except the endpoints, the node address and the contract addresses has a
//! default, so `staderd init` writes a file that only needs those filled in.
//!
//! # Example node.toml
//!
//! ```toml
//! execution-rpc-url = "http://localhost:8545"
//! beacon-url = "http://localhost:5052"
//! node-address = "0x..."
//! request-timeout-secs = 10
//! beacon-batch-size = 100
//! archive = true
//!
//! [contracts]
//! permissionless-node-registry = "0x..."
//! # ...
//!
//! [refresh]
//! interval-secs = 60
//! max-concurrency = 16
//! slot-lookback = 8
//! slot-source = "finalized"
//!
//! [metrics]
//! enabled = true
//! listen-addr = "0.0.0.0:9102"
//! ```

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use stader_chain::{ClientConfig, ContractAddresses, SlotTag};
use stader_state::RefresherConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable for home directory override.
///
/// Takes precedence over the default home directory (`~/.staderd`).
///
/// # Example
///
/// ```bash
/// export STADERD_HOME=/srv/staderd
/// staderd start
/// ```
pub const STADERD_HOME_ENV: &str = "STADERD_HOME";

/// Default home directory name (relative to user's home directory).
pub const DEFAULT_HOME_DIR: &str = ".staderd";

/// Node configuration filename inside `{home}/config`.
pub const NODE_CONFIG_FILENAME: &str = "node.toml";

/// Default Prometheus listen port.
pub const DEFAULT_METRICS_PORT: u16 = 9102;

/// Snapshot refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RefreshConfig {
    /// Seconds between snapshot builds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on concurrent upstream reads within one build.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Earlier slots to try when the target slot has no block.
    #[serde(default = "default_slot_lookback")]
    pub slot_lookback: u64,

    /// Anchor builds to the head or the finalized slot.
    #[serde(default)]
    pub slot_source: SlotTag,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_max_concurrency() -> usize {
    stader_state::DEFAULT_MAX_CONCURRENCY
}

fn default_slot_lookback() -> u64 {
    8
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrency: default_max_concurrency(),
            slot_lookback: default_slot_lookback(),
            slot_source: SlotTag::default(),
        }
    }
}

/// Prometheus endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_metrics_listen")]
    pub listen_addr: SocketAddr,
}

fn default_true() -> bool {
    true
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_METRICS_PORT))
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_metrics_listen(),
        }
    }
}

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeConfig {
    /// Execution client JSON-RPC endpoint.
    #[serde(default)]
    pub execution_rpc_url: String,

    /// Beacon node REST endpoint.
    #[serde(default)]
    pub beacon_url: String,

    /// Address of the operator this node reports on.
    #[serde(default)]
    pub node_address: Address,

    /// Per-request timeout for both endpoints.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Keys per beacon validator-status request.
    #[serde(default = "default_beacon_batch_size")]
    pub beacon_batch_size: usize,

    /// Whether the execution endpoint serves state at past blocks.
    ///
    /// Without archive access snapshots are built from latest state and
    /// marked best-effort.
    #[serde(default = "default_true")]
    pub archive: bool,

    #[serde(default)]
    pub contracts: ContractAddresses,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_beacon_batch_size() -> usize {
    100
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            execution_rpc_url: "http://localhost:8545".to_string(),
            beacon_url: "http://localhost:5052".to_string(),
            node_address: Address::ZERO,
            request_timeout_secs: default_request_timeout_secs(),
            beacon_batch_size: default_beacon_batch_size(),
            archive: true,
            contracts: ContractAddresses::default(),
            refresh: RefreshConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Get the path to the node config file.
    pub fn config_path(home: &Path) -> PathBuf {
        home.join("config").join(NODE_CONFIG_FILENAME)
    }

    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read node config: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse node config: {}", path.display()))
    }

    /// Load `{home}/config/node.toml`, pointing at `staderd init` when absent.
    pub fn load_from_home(home: &Path) -> Result<Self> {
        let path = Self::config_path(home);
        if !path.exists() {
            bail!(
                "Configuration file not found: {}\nRun 'staderd init' first to create configuration.",
                path.display()
            );
        }
        Self::load(&path)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize node config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write node config: {}", path.display()))?;

        Ok(())
    }

    /// Reject configurations the daemon cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.execution_rpc_url.trim().is_empty() {
            bail!("execution-rpc-url must not be empty");
        }
        if self.beacon_url.trim().is_empty() {
            bail!("beacon-url must not be empty");
        }
        if self.request_timeout_secs == 0 {
            bail!("request-timeout-secs must be greater than zero");
        }
        if self.beacon_batch_size == 0 {
            bail!("beacon-batch-size must be greater than zero");
        }
        if self.refresh.interval_secs == 0 {
            bail!("refresh.interval-secs must be greater than zero");
        }
        if self.refresh.max_concurrency == 0 {
            bail!("refresh.max-concurrency must be greater than zero");
        }
        let unset = self.contracts.unset();
        if !unset.is_empty() {
            bail!("contract addresses not set: {}", unset.join(", "));
        }
        Ok(())
    }

    /// Settings for the JSON-RPC and beacon clients.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            beacon_batch_size: self.beacon_batch_size,
            archive: self.archive,
        }
    }

    /// Settings for the background refresher.
    pub fn refresher_config(&self) -> RefresherConfig {
        RefresherConfig {
            interval: Duration::from_secs(self.refresh.interval_secs),
            slot_source: self.refresh.slot_source,
            slot_lookback: self.refresh.slot_lookback,
        }
    }
}
