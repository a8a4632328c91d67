//! Stader node-operator daemon.
//!
//! Wires the JSON-RPC registry client and the beacon client into a snapshot
//! refresher, and exposes the served snapshot through Prometheus, a JSON
//! `/snapshot` endpoint and the `staderd` CLI.

pub mod config;
pub mod daemon;
pub mod node;
pub mod report;
pub mod supervisor;

pub use config::{
    MetricsConfig, NodeConfig, RefreshConfig, DEFAULT_HOME_DIR, DEFAULT_METRICS_PORT,
    NODE_CONFIG_FILENAME, STADERD_HOME_ENV,
};
pub use daemon::DaemonClient;
pub use node::Node;
pub use report::{render_network, render_status, NetworkReport, StatusReport};
pub use supervisor::{NodeSupervisor, ShutdownError, SupervisedResult};
