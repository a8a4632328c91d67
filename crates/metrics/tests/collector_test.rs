//! Gauges reflect the snapshot served by the cache at scrape time.

use std::sync::Arc;

use alloy_primitives::Address;
use stader_chain::{
    stub_block_hash, validator_status, StubBeaconSource, StubChainRegistry,
};
use stader_metrics::{encode_text, SnapshotCollector};
use stader_state::{SnapshotBuilder, SnapshotCache};
use stader_types::{
    units::eth, BeaconValidatorState, OperatorRecord, ValidatorContractStatus, ValidatorPubkey,
    ValidatorRecord,
};

fn node_address() -> Address {
    Address::repeat_byte(0xaa)
}

fn record(n: u8) -> ValidatorRecord {
    ValidatorRecord {
        id: u64::from(n),
        pubkey: ValidatorPubkey::from_bytes([n; 48]),
        operator_id: 1,
        status: ValidatorContractStatus::Deposited,
        withdraw_vault: Address::repeat_byte(0x10 + n),
        deposit_block: 100,
        withdrawn_block: 0,
    }
}

fn scrape() -> String {
    String::from_utf8(encode_text().unwrap()).unwrap()
}

fn assert_line(text: &str, line: &str) {
    assert!(
        text.lines().any(|l| l == line),
        "missing `{line}` in:\n{text}"
    );
}

#[tokio::test]
async fn test_collector_exports_served_snapshot() {
    let registry = Arc::new(StubChainRegistry::new());
    let beacon = Arc::new(StubBeaconSource::new());
    registry.add_operator(
        OperatorRecord {
            id: 1,
            operator_address: node_address(),
            reward_address: Address::repeat_byte(0xbb),
            name: "alpha".to_string(),
            active: true,
            opted_for_socializing_pool: false,
        },
        vec![record(1), record(2)],
    );
    beacon.set_status(validator_status(
        ValidatorPubkey::from_bytes([1; 48]),
        1,
        BeaconValidatorState::ActiveOngoing,
        false,
    ));
    beacon.set_status(validator_status(
        ValidatorPubkey::from_bytes([2; 48]),
        2,
        BeaconValidatorState::ExitedSlashed,
        true,
    ));
    beacon.add_block(100, 5_000);
    registry.set_block_hash(5_000, stub_block_hash(5_000));
    registry.set_network_counts(42, 7);
    registry.set_penalty(ValidatorPubkey::from_bytes([2; 48]), eth(1));

    let cache = Arc::new(SnapshotCache::new(node_address()));
    let collector = SnapshotCollector::new(cache.clone());

    collector.update();
    let before = scrape();
    assert_line(&before, "stader_snapshot_ready 0");
    assert_line(&before, "stader_snapshot_builds_succeeded 0");

    let builder = SnapshotBuilder::new(registry, beacon, node_address());
    cache.install(builder.build_snapshot(100).await.unwrap()).unwrap();
    cache.record_success(std::time::Duration::from_millis(250));

    collector.update();
    let after = scrape();
    assert_line(&after, "stader_snapshot_ready 1");
    assert_line(&after, "stader_snapshot_degraded 0");
    assert_line(&after, "stader_snapshot_beacon_slot 100");
    assert_line(&after, "stader_snapshot_execution_block 5000");
    assert_line(&after, "stader_snapshot_builds_succeeded 1");
    assert_line(&after, "stader_snapshot_build_duration_seconds 0.25");

    assert_line(&after, "stader_node_registered 1");
    assert_line(&after, "stader_node_operator_id 1");
    assert_line(&after, "stader_node_total_keys 2");
    assert_line(&after, "stader_node_validators{bucket=\"active\"} 1");
    assert_line(&after, "stader_node_validators{bucket=\"exiting\"} 1");
    assert_line(&after, "stader_node_validators{bucket=\"slashed\"} 1");
    assert_line(&after, "stader_node_validators{bucket=\"unknown\"} 0");
    assert_line(&after, "stader_node_cumulative_penalty 1");

    assert_line(&after, "stader_network_total_validators_active 42");
    assert_line(&after, "stader_network_total_validators_queued 7");
    assert_line(&after, "stader_network_collateral_ratio 4");

    // An unregistered node zeroes the operator gauges.
    stader_metrics::node::observe(None);
    let unregistered = scrape();
    assert_line(&unregistered, "stader_node_registered 0");
    assert_line(&unregistered, "stader_node_total_keys 0");
    assert_line(&unregistered, "stader_network_total_validators_active 42");
}
