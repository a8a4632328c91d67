//! Stader Prometheus metrics.
//!
//! Gauges are grouped by scope: network-wide figures, the tracked operator,
//! and the health of the snapshot refresh. A [`SnapshotCollector`] copies the
//! served snapshot into them at scrape time.

pub mod collector;
pub mod network;
pub mod node;
pub mod server;
pub mod snapshot;

pub use collector::SnapshotCollector;
pub use server::{serve, spawn_metrics_server, start_metrics_server};

use once_cell::sync::Lazy;
use prometheus::Registry;

/// Global Prometheus registry for all Stader metrics.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();

    network::register_metrics(&registry);
    node::register_metrics(&registry);
    snapshot::register_metrics(&registry);

    registry
});

/// Initialize all metrics. Call once at startup.
pub fn init() {
    Lazy::force(&REGISTRY);
    tracing::info!("Stader metrics initialized");
}

/// Encode everything in [`REGISTRY`] in the Prometheus text format.
pub fn encode_text() -> Result<Vec<u8>, prometheus::Error> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}
