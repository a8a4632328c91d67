//! Background refresh loop.
//!
//! One task rebuilds the snapshot on a fixed interval (or when poked through
//! a [`RefreshHandle`]) and installs it into the [`SnapshotCache`]. Failures
//! are logged and counted; the previous snapshot keeps being served.

use std::sync::Arc;
use std::time::{Duration, Instant};

use stader_chain::SlotTag;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::builder::SnapshotBuilder;
use crate::cache::SnapshotCache;
use crate::error::{ChainResultExt, ErrorKind, Result, StateError};
use crate::snapshot::NetworkSnapshot;

/// Refresh cadence and slot selection.
#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Time between builds.
    pub interval: Duration,
    /// Which beacon slot to anchor builds to.
    pub slot_source: SlotTag,
    /// Earlier slots to try when the target slot has no block.
    pub slot_lookback: u64,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            slot_source: SlotTag::Finalized,
            slot_lookback: 8,
        }
    }
}

/// Requests an early rebuild.
#[derive(Clone)]
pub struct RefreshHandle {
    trigger: Arc<Notify>,
}

impl RefreshHandle {
    /// Start a rebuild without waiting for the next tick.
    ///
    /// Triggers arriving while a build runs collapse into one follow-up build.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }
}

/// Drives the [`SnapshotBuilder`] and feeds the [`SnapshotCache`].
pub struct Refresher {
    builder: Arc<SnapshotBuilder>,
    cache: Arc<SnapshotCache>,
    config: RefresherConfig,
    trigger: Arc<Notify>,
}

impl Refresher {
    /// Create a refresher.
    pub fn new(
        builder: Arc<SnapshotBuilder>,
        cache: Arc<SnapshotCache>,
        config: RefresherConfig,
    ) -> Self {
        Self {
            builder,
            cache,
            config,
            trigger: Arc::new(Notify::new()),
        }
    }

    /// Handle for external rebuild triggers.
    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            trigger: self.trigger.clone(),
        }
    }

    /// Cache this refresher installs into.
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Build at exactly `slot` and install the result.
    ///
    /// A result that completes after `cancel` fires is discarded.
    pub async fn refresh_at(
        &self,
        slot: u64,
        cancel: &CancellationToken,
    ) -> Result<Arc<NetworkSnapshot>> {
        let _building = self.cache.begin_build();
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(slot, "Snapshot build cancelled");
                return Err(StateError::Cancelled);
            }
            result = self.builder.build_snapshot(slot) => result,
        };
        let snapshot = result?;

        if cancel.is_cancelled() {
            info!(slot, "Discarding snapshot finished after cancellation");
            return Err(StateError::Cancelled);
        }
        let installed = self.cache.install(snapshot).map_err(|_| {
            info!(slot, "Discarding snapshot, cache closed");
            StateError::Cancelled
        })?;

        self.cache.record_success(started.elapsed());
        info!(
            slot = installed.beacon_slot,
            block = installed.execution_block,
            consistency = ?installed.consistency,
            "Snapshot installed"
        );
        Ok(installed)
    }

    /// Pick the configured slot and build there, stepping back over empty
    /// slots up to `slot_lookback` times.
    pub async fn refresh_once(&self, cancel: &CancellationToken) -> Result<Arc<NetworkSnapshot>> {
        let tag = self.config.slot_source;
        let target = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StateError::Cancelled),
            slot = self.builder.beacon().slot(tag) => {
                slot.upstream(|| format!("{} slot", tag.as_str()))?
            }
        };

        let mut offset = 0;
        loop {
            let slot = target.saturating_sub(offset);
            match self.refresh_at(slot, cancel).await {
                Err(StateError::SlotNotFound { .. })
                    if offset < self.config.slot_lookback && slot > 0 =>
                {
                    debug!(slot, "No block at slot, trying previous");
                    offset += 1;
                }
                other => return other,
            }
        }
    }

    /// Run until `cancel` fires, then close the cache.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            slot_source = self.config.slot_source.as_str(),
            "Snapshot refresher started"
        );

        loop {
            match self.refresh_once(&cancel).await {
                Ok(_) => {}
                Err(StateError::Cancelled) => break,
                Err(e) => {
                    self.cache.record_failure(&e);
                    let failures = self.cache.stats().consecutive_failures;
                    match e.kind() {
                        ErrorKind::InconsistentPairing => {
                            error!(error = ?e, failures, "Snapshot build failed: {}", e)
                        }
                        _ => warn!(error = ?e, failures, "Snapshot build failed: {}", e),
                    }
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = self.trigger.notified() => debug!("Refresh triggered"),
            }
        }

        self.cache.close();
        info!("Snapshot refresher stopped");
    }
}
