//! Snapshot freshness and refresh health.

use once_cell::sync::Lazy;
use prometheus::{Gauge, Registry};
use stader_state::{NetworkSnapshot, RefreshPhase, SnapshotCache};
use std::time::{SystemTime, UNIX_EPOCH};

pub static SNAPSHOT_READY: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_snapshot_ready", "1 once a snapshot is being served")
        .expect("metric can be created")
});

pub static SNAPSHOT_BUILDING: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_snapshot_building", "1 while a rebuild is in flight")
        .expect("metric can be created")
});

pub static SNAPSHOT_AGE_SECONDS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_age_seconds",
        "Seconds since the served snapshot was built",
    )
    .expect("metric can be created")
});

pub static SNAPSHOT_LAST_SUCCESS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_last_success_timestamp_seconds",
        "Unix time of the last installed snapshot",
    )
    .expect("metric can be created")
});

pub static SNAPSHOT_BUILD_DURATION: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_build_duration_seconds",
        "Wall time of the last successful build",
    )
    .expect("metric can be created")
});

pub static SNAPSHOT_BUILDS_SUCCEEDED: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_builds_succeeded",
        "Snapshots installed since start",
    )
    .expect("metric can be created")
});

pub static SNAPSHOT_BUILDS_FAILED: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_snapshot_builds_failed", "Builds failed since start")
        .expect("metric can be created")
});

pub static SNAPSHOT_CONSECUTIVE_FAILURES: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_consecutive_failures",
        "Builds failed since the last success",
    )
    .expect("metric can be created")
});

// Snapshot block anchor
pub static SNAPSHOT_DEGRADED: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_degraded",
        "1 if registry reads could not be pinned to the snapshot block",
    )
    .expect("metric can be created")
});

pub static SNAPSHOT_BEACON_SLOT: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_snapshot_beacon_slot", "Beacon slot of the snapshot")
        .expect("metric can be created")
});

pub static SNAPSHOT_EXECUTION_BLOCK: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_snapshot_execution_block",
        "Execution block of the snapshot",
    )
    .expect("metric can be created")
});

/// Set the health gauges from `cache` and the anchor gauges from `current`.
///
/// `current` must be the snapshot the network and node gauges of the same
/// scrape are set from.
pub fn observe(cache: &SnapshotCache, current: Option<&NetworkSnapshot>) {
    let phase = cache.phase();
    SNAPSHOT_BUILDING.set(flag(phase == RefreshPhase::Building));

    let stats = cache.stats();
    SNAPSHOT_BUILDS_SUCCEEDED.set(stats.builds_succeeded as f64);
    SNAPSHOT_BUILDS_FAILED.set(stats.builds_failed as f64);
    SNAPSHOT_CONSECUTIVE_FAILURES.set(stats.consecutive_failures as f64);
    if let Some(at) = stats.last_success_unix {
        SNAPSHOT_LAST_SUCCESS.set(at as f64);
    }
    if let Some(duration) = stats.last_build_duration {
        SNAPSHOT_BUILD_DURATION.set(duration.as_secs_f64());
    }

    match current {
        Some(snapshot) => {
            SNAPSHOT_READY.set(1.0);
            SNAPSHOT_DEGRADED.set(flag(snapshot.is_degraded()));
            SNAPSHOT_BEACON_SLOT.set(snapshot.beacon_slot as f64);
            SNAPSHOT_EXECUTION_BLOCK.set(snapshot.execution_block as f64);
            SNAPSHOT_AGE_SECONDS.set(age_seconds(snapshot.built_at));
        }
        None => SNAPSHOT_READY.set(0.0),
    }
}

fn age_seconds(built_at: u64) -> f64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(built_at);
    now.saturating_sub(built_at) as f64
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Register all snapshot health metrics with the given registry.
pub fn register_metrics(registry: &Registry) {
    registry.register(Box::new(SNAPSHOT_READY.clone())).ok();
    registry.register(Box::new(SNAPSHOT_BUILDING.clone())).ok();
    registry.register(Box::new(SNAPSHOT_AGE_SECONDS.clone())).ok();
    registry
        .register(Box::new(SNAPSHOT_LAST_SUCCESS.clone()))
        .ok();
    registry
        .register(Box::new(SNAPSHOT_BUILD_DURATION.clone()))
        .ok();
    registry
        .register(Box::new(SNAPSHOT_BUILDS_SUCCEEDED.clone()))
        .ok();
    registry
        .register(Box::new(SNAPSHOT_BUILDS_FAILED.clone()))
        .ok();
    registry
        .register(Box::new(SNAPSHOT_CONSECUTIVE_FAILURES.clone()))
        .ok();
    registry.register(Box::new(SNAPSHOT_DEGRADED.clone())).ok();
    registry
        .register(Box::new(SNAPSHOT_BEACON_SLOT.clone()))
        .ok();
    registry
        .register(Box::new(SNAPSHOT_EXECUTION_BLOCK.clone()))
        .ok();
}
