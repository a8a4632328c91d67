//! Daemon wiring: clients, builder, refresher and metrics endpoint.

use crate::config::NodeConfig;
use crate::daemon::DaemonClient;
use crate::supervisor::NodeSupervisor;
use anyhow::{Context, Result};
use stader_chain::{BeaconSource, ChainRegistry, HttpBeaconSource, RpcChainRegistry};
use stader_metrics::SnapshotCollector;
use stader_state::{NetworkSnapshot, Refresher, SnapshotBuilder, SnapshotCache};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One operator's aggregation service.
pub struct Node {
    config: NodeConfig,
    builder: Arc<SnapshotBuilder>,
    cache: Arc<SnapshotCache>,
}

impl Node {
    /// Validate `config` and connect the production clients.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;
        let client = config.client_config();

        let registry = RpcChainRegistry::new(&config.execution_rpc_url, config.contracts, &client)
            .context("Failed to create execution RPC client")?;
        let beacon = HttpBeaconSource::new(&config.beacon_url, &client)
            .context("Failed to create beacon client")?;

        Ok(Self::with_sources(config, Arc::new(registry), Arc::new(beacon)))
    }

    /// Build a node on top of arbitrary registry and beacon sources.
    pub fn with_sources(
        config: NodeConfig,
        registry: Arc<dyn ChainRegistry>,
        beacon: Arc<dyn BeaconSource>,
    ) -> Self {
        let builder = SnapshotBuilder::new(registry, beacon, config.node_address)
            .with_max_concurrency(config.refresh.max_concurrency);
        let cache = Arc::new(SnapshotCache::new(config.node_address));
        Self {
            config,
            builder: Arc::new(builder),
            cache,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Cache the refresher installs into.
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    fn refresher(&self) -> Refresher {
        Refresher::new(
            self.builder.clone(),
            self.cache.clone(),
            self.config.refresher_config(),
        )
    }

    /// Build one snapshot without starting the background loop.
    ///
    /// With `slot`, the build is anchored there exactly; otherwise the
    /// configured slot source is used with the usual lookback.
    pub async fn snapshot(&self, slot: Option<u64>) -> Result<Arc<NetworkSnapshot>> {
        let snapshot = match slot {
            Some(slot) => Arc::new(
                self.builder
                    .build_snapshot(slot)
                    .await
                    .with_context(|| format!("Failed to build snapshot at slot {slot}"))?,
            ),
            None => self
                .refresher()
                .refresh_once(&CancellationToken::new())
                .await
                .context("Failed to build snapshot")?,
        };
        Ok(snapshot)
    }

    /// Snapshot for a CLI read.
    ///
    /// Without `slot`, the snapshot a running daemon has cached is preferred;
    /// a fresh build happens only when no daemon answers with one.
    pub async fn read_snapshot(&self, slot: Option<u64>) -> Result<Arc<NetworkSnapshot>> {
        if slot.is_none() && self.config.metrics.enabled {
            let daemon = DaemonClient::new(&self.config)?;
            match daemon.served_snapshot().await {
                Ok(Some(snapshot)) => {
                    debug!("Using snapshot served by {}", daemon.base_url());
                    return Ok(Arc::new(snapshot));
                }
                Ok(None) => debug!("No served snapshot, building one"),
                Err(e) => warn!("Ignoring daemon snapshot: {:#}", e),
            }
        }
        self.snapshot(slot).await
    }

    /// Run with a default supervisor until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        self.run_with_supervisor(NodeSupervisor::new()).await
    }

    /// Run until Ctrl+C or until the supervisor's token is cancelled.
    pub async fn run_with_supervisor(self, supervisor: NodeSupervisor) -> Result<()> {
        info!(
            node_address = %self.config.node_address,
            execution = %self.config.execution_rpc_url,
            beacon = %self.config.beacon_url,
            "Starting staderd"
        );

        // Bind before spawning anything so a taken port fails startup.
        let listener = if self.config.metrics.enabled {
            let addr = self.config.metrics.listen_addr;
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind metrics listener on {addr}"))?;
            info!("Metrics server listening on http://{}/metrics", addr);
            Some(listener)
        } else {
            info!("Metrics server disabled");
            None
        };

        let refresher = self.refresher();
        let refresh = refresher.handle();
        supervisor.spawn_cancellable("refresher", move |token| async move {
            refresher.run(token).await;
            Ok(())
        });

        if let Some(listener) = listener {
            stader_metrics::init();
            let collector =
                Arc::new(SnapshotCollector::new(self.cache.clone()).with_refresh(refresh));
            supervisor.spawn_critical("metrics-server", move |token| async move {
                stader_metrics::serve(listener, Some(collector), token).await;
                Ok(())
            });
        }

        let token = supervisor.cancellation_token();
        tokio::select! {
            _ = token.cancelled() => info!("Shutdown requested"),
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => info!("Received Ctrl+C"),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            },
        }

        if let Err(e) = supervisor.shutdown().await {
            warn!("Some tasks did not complete cleanly: {}", e);
        }
        info!("Node shutdown complete");
        Ok(())
    }
}
