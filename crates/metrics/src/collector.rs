//! Scrape-time bridge from the snapshot cache to the gauges.

use std::sync::Arc;

use parking_lot::{const_mutex, Mutex};
use stader_state::{RefreshHandle, SnapshotCache};

use crate::{encode_text, network, node, snapshot};

// Gauges are process-global; one scrape at a time sets and gathers them.
static SCRAPE_LOCK: Mutex<()> = const_mutex(());

/// Copies the currently served snapshot into the registered gauges.
///
/// Called on every `/metrics` request, so a scrape always reflects the
/// snapshot a reader would get at that moment and never waits for a build.
/// Each update reads the cache once; the slot, network and operator gauges
/// of one scrape always come from the same build.
#[derive(Clone)]
pub struct SnapshotCollector {
    cache: Arc<SnapshotCache>,
    refresh: Option<RefreshHandle>,
}

impl SnapshotCollector {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self {
            cache,
            refresh: None,
        }
    }

    /// Allow `/refresh` to request an early rebuild through `handle`.
    pub fn with_refresh(mut self, handle: RefreshHandle) -> Self {
        self.refresh = Some(handle);
        self
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Ask the refresher for an early rebuild. Returns `false` when no
    /// refresher is attached.
    pub fn request_refresh(&self) -> bool {
        match &self.refresh {
            Some(handle) => {
                handle.trigger();
                true
            }
            None => false,
        }
    }

    /// Refresh the gauges from the cache.
    ///
    /// Network and operator gauges keep their last values while the cache
    /// is empty; health gauges are always updated.
    pub fn update(&self) {
        let _guard = SCRAPE_LOCK.lock();
        self.update_locked();
    }

    /// Refresh the gauges and encode the registry as one step.
    pub fn scrape(&self) -> Result<Vec<u8>, prometheus::Error> {
        let _guard = SCRAPE_LOCK.lock();
        self.update_locked();
        encode_text()
    }

    fn update_locked(&self) {
        let current = self.cache.get_network_snapshot().ok();
        snapshot::observe(&self.cache, current.as_deref());
        if let Some(current) = current {
            network::observe(&current);
            node::observe(current.operator.as_ref());
        }
    }
}
