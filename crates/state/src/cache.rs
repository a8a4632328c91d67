//! Snapshot cache.
//!
//! Holds the current [`NetworkSnapshot`] behind a single `Arc` swap. Reads
//! clone the `Arc` under a read lock and return; the write lock is held only
//! for the swap itself, never while a build is running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use alloy_primitives::Address;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::error::CacheError;
use crate::snapshot::NetworkSnapshot;

/// Refresh state as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// Nothing built yet.
    Empty,
    /// A build is in flight; the previous snapshot (if any) is still served.
    Building,
    /// A snapshot is installed and no build is running.
    Ready,
}

/// Build bookkeeping for health reporting.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Snapshots installed.
    pub builds_succeeded: u64,
    /// Builds that failed.
    pub builds_failed: u64,
    /// Failures since the last success.
    pub consecutive_failures: u64,
    /// Unix seconds of the last install.
    pub last_success_unix: Option<u64>,
    /// Wall time of the last successful build.
    pub last_build_duration: Option<Duration>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

#[derive(Default)]
struct Slot {
    snapshot: Option<Arc<NetworkSnapshot>>,
    installed_at: Option<Instant>,
    closed: bool,
}

/// Holder of the current snapshot.
pub struct SnapshotCache {
    tracked: Address,
    slot: RwLock<Slot>,
    building: AtomicBool,
    generation: watch::Sender<u64>,
    stats: Mutex<CacheStats>,
}

/// Marks the cache as building until dropped.
pub struct BuildGuard<'a> {
    cache: &'a SnapshotCache,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.cache.building.store(false, Ordering::Release);
    }
}

impl SnapshotCache {
    /// Create an empty cache for the operator at `tracked`.
    pub fn new(tracked: Address) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            tracked,
            slot: RwLock::new(Slot::default()),
            building: AtomicBool::new(false),
            generation,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Address whose operator view this cache serves.
    pub fn tracked_address(&self) -> Address {
        self.tracked
    }

    /// Current snapshot for `operator`.
    ///
    /// Never waits for a build. Returns [`CacheError::NotReady`] until the
    /// first snapshot is installed.
    pub fn get_snapshot(&self, operator: Address) -> Result<Arc<NetworkSnapshot>, CacheError> {
        if operator != self.tracked {
            return Err(CacheError::OperatorNotTracked {
                requested: operator,
                tracked: self.tracked,
            });
        }
        self.get_network_snapshot()
    }

    /// Current snapshot, for network-wide consumers.
    pub fn get_network_snapshot(&self) -> Result<Arc<NetworkSnapshot>, CacheError> {
        self.slot.read().snapshot.clone().ok_or(CacheError::NotReady)
    }

    /// Wait until a snapshot is installed.
    ///
    /// Returns immediately when one already is; fails with
    /// [`CacheError::Closed`] if the cache closes while still empty.
    pub async fn wait_ready(&self) -> Result<Arc<NetworkSnapshot>, CacheError> {
        let mut rx = self.generation.subscribe();
        loop {
            {
                let slot = self.slot.read();
                if let Some(snapshot) = &slot.snapshot {
                    return Ok(snapshot.clone());
                }
                if slot.closed {
                    return Err(CacheError::Closed);
                }
            }
            rx.changed().await.map_err(|_| CacheError::Closed)?;
        }
    }

    /// Current refresh phase.
    pub fn phase(&self) -> RefreshPhase {
        if self.building.load(Ordering::Acquire) {
            RefreshPhase::Building
        } else if self.slot.read().snapshot.is_some() {
            RefreshPhase::Ready
        } else {
            RefreshPhase::Empty
        }
    }

    /// Enter `Building` until the guard drops.
    pub fn begin_build(&self) -> BuildGuard<'_> {
        self.building.store(true, Ordering::Release);
        BuildGuard { cache: self }
    }

    /// Replace the current snapshot.
    ///
    /// Fails with [`CacheError::Closed`] after [`SnapshotCache::close`].
    pub fn install(&self, snapshot: NetworkSnapshot) -> Result<Arc<NetworkSnapshot>, CacheError> {
        let snapshot = Arc::new(snapshot);
        {
            let mut slot = self.slot.write();
            if slot.closed {
                return Err(CacheError::Closed);
            }
            slot.snapshot = Some(snapshot.clone());
            slot.installed_at = Some(Instant::now());
        }
        self.generation.send_modify(|generation| *generation += 1);
        Ok(snapshot)
    }

    /// Record a successful build of `duration`.
    pub fn record_success(&self, duration: Duration) {
        let mut stats = self.stats.lock();
        stats.builds_succeeded += 1;
        stats.consecutive_failures = 0;
        stats.last_build_duration = Some(duration);
        stats.last_success_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs());
    }

    /// Record a failed build.
    pub fn record_failure(&self, error: &dyn std::error::Error) {
        let mut stats = self.stats.lock();
        stats.builds_failed += 1;
        stats.consecutive_failures += 1;
        stats.last_error = Some(error.to_string());
    }

    /// Copy of the build counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    /// Time since the current snapshot was installed.
    pub fn age(&self) -> Option<Duration> {
        self.slot.read().installed_at.map(|at| at.elapsed())
    }

    /// Refuse further installs and wake waiters.
    ///
    /// The last snapshot stays readable.
    pub fn close(&self) {
        self.slot.write().closed = true;
        self.generation.send_modify(|_| {});
    }

    /// Whether [`SnapshotCache::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.slot.read().closed
    }

    /// Number of installs so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Consistency, NetworkDetails};
    use alloy_primitives::{B256, U256};
    use stader_types::{RewardParams, PERMISSIONLESS_POOL_ID};

    fn snapshot(slot: u64) -> NetworkSnapshot {
        NetworkSnapshot {
            beacon_slot: slot,
            execution_block: slot * 10,
            execution_block_hash: B256::ZERO,
            consistency: Consistency::Pinned,
            built_at: 0,
            node_address: Address::repeat_byte(1),
            reward_params: RewardParams {
                pool_id: PERMISSIONLESS_POOL_ID,
                staked_eth_per_node: U256::ZERO,
                collateral_eth: U256::ZERO,
                protocol_fee_bps: U256::ZERO,
                operator_fee_bps: U256::ZERO,
            },
            rewards_threshold: U256::ZERO,
            network: NetworkDetails::default(),
            operator: None,
        }
    }

    #[test]
    fn test_empty_cache_not_ready() {
        let cache = SnapshotCache::new(Address::repeat_byte(1));
        assert_eq!(cache.phase(), RefreshPhase::Empty);
        assert_eq!(
            cache.get_network_snapshot().unwrap_err(),
            CacheError::NotReady
        );
        assert!(cache.age().is_none());
    }

    #[test]
    fn test_install_and_read() {
        let cache = SnapshotCache::new(Address::repeat_byte(1));
        cache.install(snapshot(5)).unwrap();
        assert_eq!(cache.phase(), RefreshPhase::Ready);
        assert_eq!(
            cache
                .get_snapshot(Address::repeat_byte(1))
                .unwrap()
                .beacon_slot,
            5
        );
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn test_untracked_operator() {
        let cache = SnapshotCache::new(Address::repeat_byte(1));
        cache.install(snapshot(5)).unwrap();
        let err = cache.get_snapshot(Address::repeat_byte(2)).unwrap_err();
        assert!(matches!(err, CacheError::OperatorNotTracked { .. }));
    }

    #[test]
    fn test_building_phase_keeps_previous() {
        let cache = SnapshotCache::new(Address::repeat_byte(1));
        cache.install(snapshot(5)).unwrap();
        {
            let _guard = cache.begin_build();
            assert_eq!(cache.phase(), RefreshPhase::Building);
            assert_eq!(cache.get_network_snapshot().unwrap().beacon_slot, 5);
        }
        assert_eq!(cache.phase(), RefreshPhase::Ready);
    }

    #[test]
    fn test_closed_rejects_install() {
        let cache = SnapshotCache::new(Address::repeat_byte(1));
        cache.install(snapshot(5)).unwrap();
        cache.close();
        assert_eq!(cache.install(snapshot(6)).unwrap_err(), CacheError::Closed);
        assert_eq!(cache.get_network_snapshot().unwrap().beacon_slot, 5);
    }

    #[test]
    fn test_stats() {
        let cache = SnapshotCache::new(Address::ZERO);
        let err = CacheError::NotReady;
        cache.record_failure(&err);
        cache.record_failure(&err);
        assert_eq!(cache.stats().consecutive_failures, 2);
        cache.record_success(Duration::from_millis(20));
        let stats = cache.stats();
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.builds_failed, 2);
        assert_eq!(stats.builds_succeeded, 1);
        assert!(stats.last_success_unix.is_some());
    }

    #[tokio::test]
    async fn test_wait_ready_wakes_on_install() {
        let cache = Arc::new(SnapshotCache::new(Address::ZERO));
        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.wait_ready().await })
        };
        tokio::task::yield_now().await;
        cache.install(snapshot(9)).unwrap();
        let snapshot = waiter.await.unwrap().unwrap();
        assert_eq!(snapshot.beacon_slot, 9);
    }

    #[tokio::test]
    async fn test_wait_ready_fails_when_closed_empty() {
        let cache = Arc::new(SnapshotCache::new(Address::ZERO));
        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.wait_ready().await })
        };
        tokio::task::yield_now().await;
        cache.close();
        assert_eq!(waiter.await.unwrap().unwrap_err(), CacheError::Closed);
    }
}
