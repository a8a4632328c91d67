//! Hand-built snapshots for server and collector tests.

#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256};
use stader_state::{Consistency, NetworkDetails, NetworkSnapshot};
use stader_types::{units::eth, RewardParams, PERMISSIONLESS_POOL_ID};

pub fn node_address() -> Address {
    Address::repeat_byte(0xaa)
}

/// Snapshot whose slot, block and network counters all derive from `n`.
pub fn snapshot_at(n: u64) -> NetworkSnapshot {
    NetworkSnapshot {
        beacon_slot: n,
        execution_block: n * 10,
        execution_block_hash: B256::with_last_byte(n as u8),
        consistency: Consistency::Pinned,
        built_at: 0,
        node_address: node_address(),
        reward_params: RewardParams {
            pool_id: PERMISSIONLESS_POOL_ID,
            staked_eth_per_node: eth(32),
            collateral_eth: eth(4),
            protocol_fee_bps: U256::from(500),
            operator_fee_bps: U256::from(500),
        },
        rewards_threshold: eth(8),
        network: NetworkDetails {
            total_validators: n,
            total_operators: n,
            ..Default::default()
        },
        operator: None,
    }
}
