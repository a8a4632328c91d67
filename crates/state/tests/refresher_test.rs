//! Cache and refresher behavior: non-blocking reads, atomic installs,
//! slot lookback, failure recovery and cancellation.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::U256;
use common::{node_address, pubkey, Fixture};
use stader_chain::{ChainError, SlotTag};
use stader_state::{
    CacheError, RefreshPhase, Refresher, RefresherConfig, SnapshotCache, StateError,
};
use tokio_util::sync::CancellationToken;

fn refresher(fixture: &Fixture, interval: Duration) -> Refresher {
    let cache = Arc::new(SnapshotCache::new(node_address()));
    let config = RefresherConfig {
        interval,
        slot_source: SlotTag::Finalized,
        slot_lookback: 3,
    };
    Refresher::new(Arc::new(fixture.builder()), cache, config)
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached");
}

#[tokio::test]
async fn test_missing_slot_installs_nothing() {
    let fixture = Fixture::new(1);
    fixture.add_slot(100, 5_000);
    let refresher = refresher(&fixture, Duration::from_secs(60));

    let err = refresher
        .refresh_at(99, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::SlotNotFound { slot: 99 }));
    assert_eq!(refresher.cache().phase(), RefreshPhase::Empty);
    assert_eq!(
        refresher.cache().get_snapshot(node_address()).unwrap_err(),
        CacheError::NotReady
    );
}

#[tokio::test]
async fn test_reads_do_not_block_during_build() {
    let fixture = Fixture::new(3);
    fixture.add_slot(100, 5_000);
    let refresher = Arc::new(refresher(&fixture, Duration::from_secs(60)));
    let cancel = CancellationToken::new();
    refresher.refresh_at(100, &cancel).await.unwrap();

    fixture.add_slot(101, 5_001);
    fixture.registry.set_delay(Some(Duration::from_millis(100)));
    let build = {
        let refresher = refresher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { refresher.refresh_at(101, &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cache = refresher.cache();
    assert_eq!(cache.phase(), RefreshPhase::Building);
    let started = Instant::now();
    let snapshot = cache.get_snapshot(node_address()).unwrap();
    assert!(started.elapsed() < Duration::from_millis(20));
    assert_eq!(snapshot.beacon_slot, 100);

    build.await.unwrap().unwrap();
    assert_eq!(cache.get_snapshot(node_address()).unwrap().beacon_slot, 101);
    assert_eq!(cache.phase(), RefreshPhase::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_readers_never_see_mixed_builds() {
    let fixture = Fixture::new(3);
    let refresher = Arc::new(refresher(&fixture, Duration::from_secs(60)));
    let cancel = CancellationToken::new();
    let done = CancellationToken::new();

    let reader = {
        let cache = refresher.cache().clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut seen = 0u32;
            while !done.is_cancelled() {
                if let Ok(snapshot) = cache.get_network_snapshot() {
                    let slot = U256::from(snapshot.beacon_slot);
                    assert_eq!(snapshot.execution_block, snapshot.beacon_slot + 1_000);
                    for entry in snapshot.operator.as_ref().unwrap().validators.values() {
                        assert_eq!(entry.penalty, slot);
                    }
                    seen += 1;
                }
                tokio::task::yield_now().await;
            }
            seen
        })
    };

    for slot in 100..120u64 {
        for n in 1..=3 {
            fixture.registry.set_penalty(pubkey(n), U256::from(slot));
        }
        fixture.add_slot(slot, slot + 1_000);
        refresher.refresh_at(slot, &cancel).await.unwrap();
    }
    done.cancel();
    assert!(reader.await.unwrap() > 0);
    assert_eq!(refresher.cache().generation(), 20);
}

#[tokio::test]
async fn test_refresh_steps_back_over_empty_slots() {
    let fixture = Fixture::new(1);
    fixture.add_slot(103, 5_003);
    fixture.beacon.set_slots(105, 105);
    let refresher = refresher(&fixture, Duration::from_secs(60));

    let snapshot = refresher
        .refresh_once(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(snapshot.beacon_slot, 103);
    assert_eq!(snapshot.execution_block, 5_003);
}

#[tokio::test]
async fn test_refresh_gives_up_after_lookback() {
    let fixture = Fixture::new(1);
    fixture.add_slot(100, 5_000);
    fixture.beacon.set_slots(110, 110);
    let refresher = refresher(&fixture, Duration::from_secs(60));

    let err = refresher
        .refresh_once(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::SlotNotFound { slot: 107 }));
    assert_eq!(refresher.cache().phase(), RefreshPhase::Empty);
}

#[tokio::test]
async fn test_cancelled_build_is_discarded() {
    let fixture = Fixture::new(3);
    fixture.add_slot(100, 5_000);
    fixture.registry.set_delay(Some(Duration::from_millis(100)));
    let refresher = Arc::new(refresher(&fixture, Duration::from_secs(60)));
    let cancel = CancellationToken::new();

    let build = {
        let refresher = refresher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { refresher.refresh_at(100, &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let err = build.await.unwrap().unwrap_err();
    assert!(matches!(err, StateError::Cancelled));
    assert_eq!(refresher.cache().phase(), RefreshPhase::Empty);
    assert!(refresher.cache().get_network_snapshot().is_err());
}

#[tokio::test]
async fn test_install_after_close_is_discarded() {
    let fixture = Fixture::new(1);
    fixture.add_slot(100, 5_000);
    let refresher = refresher(&fixture, Duration::from_secs(60));
    refresher.cache().close();

    let err = refresher
        .refresh_at(100, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StateError::Cancelled));
    assert!(refresher.cache().get_network_snapshot().is_err());
}

#[tokio::test]
async fn test_run_serves_last_good_snapshot_on_failure() {
    let fixture = Fixture::new(2);
    fixture.add_slot(100, 5_000);
    let refresher = refresher(&fixture, Duration::from_millis(10));
    let cache = refresher.cache().clone();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(refresher.run(cancel.clone()));

    let first = cache.wait_ready().await.unwrap();
    assert_eq!(first.beacon_slot, 100);

    fixture
        .registry
        .fail_method("balance", ChainError::Transport("connection reset".into()));
    fixture.add_slot(101, 5_001);
    wait_for(|| cache.stats().consecutive_failures >= 2).await;

    assert_eq!(cache.get_network_snapshot().unwrap().beacon_slot, 100);
    let stats = cache.stats();
    assert!(stats.last_error.unwrap().contains("connection reset"));

    fixture.registry.clear_failures();
    wait_for(|| {
        cache
            .get_network_snapshot()
            .map(|s| s.beacon_slot == 101)
            .unwrap_or(false)
    })
    .await;
    assert_eq!(cache.stats().consecutive_failures, 0);

    cancel.cancel();
    task.await.unwrap();
    assert!(cache.is_closed());
}

#[tokio::test]
async fn test_trigger_rebuilds_before_interval() {
    let fixture = Fixture::new(1);
    fixture.add_slot(100, 5_000);
    let refresher = refresher(&fixture, Duration::from_secs(3600));
    let cache = refresher.cache().clone();
    let handle = refresher.handle();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(refresher.run(cancel.clone()));

    cache.wait_ready().await.unwrap();
    fixture.add_slot(101, 5_001);
    handle.trigger();
    wait_for(|| cache.generation() == 2).await;
    assert_eq!(cache.get_network_snapshot().unwrap().beacon_slot, 101);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_wakes_waiters_on_empty_cache() {
    let fixture = Fixture::new(1);
    // No blocks at all: every build fails with SlotNotFound.
    let refresher = refresher(&fixture, Duration::from_millis(10));
    let cache = refresher.cache().clone();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(refresher.run(cancel.clone()));

    let waiter = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.wait_ready().await })
    };
    wait_for(|| cache.stats().builds_failed >= 1).await;
    cancel.cancel();
    task.await.unwrap();

    assert_eq!(waiter.await.unwrap().unwrap_err(), CacheError::Closed);
}
