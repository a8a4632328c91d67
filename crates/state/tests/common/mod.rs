//! Shared fixture: one operator with a configurable set of keys on top of
//! the in-memory registry and beacon stubs.

#![allow(dead_code)]

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use stader_chain::{stub_block_hash, validator_status, StubBeaconSource, StubChainRegistry};
use stader_state::SnapshotBuilder;
use stader_types::{
    BeaconValidatorState, OperatorRecord, ValidatorContractStatus, ValidatorPubkey,
    ValidatorRecord,
};

pub const OPERATOR_ID: u64 = 1;

pub fn node_address() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn pubkey(n: u8) -> ValidatorPubkey {
    ValidatorPubkey::from_bytes([n; 48])
}

pub fn vault(n: u8) -> Address {
    Address::repeat_byte(0x10 + n)
}

pub fn validator(n: u8) -> ValidatorRecord {
    ValidatorRecord {
        id: u64::from(n),
        pubkey: pubkey(n),
        operator_id: OPERATOR_ID,
        status: ValidatorContractStatus::Deposited,
        withdraw_vault: vault(n),
        deposit_block: 100,
        withdrawn_block: 0,
    }
}

pub fn operator() -> OperatorRecord {
    OperatorRecord {
        id: OPERATOR_ID,
        operator_address: node_address(),
        reward_address: Address::repeat_byte(0xbb),
        name: "alpha".to_string(),
        active: true,
        opted_for_socializing_pool: false,
    }
}

pub struct Fixture {
    pub registry: Arc<StubChainRegistry>,
    pub beacon: Arc<StubBeaconSource>,
}

impl Fixture {
    /// Operator 1 with keys `1..=keys`, all active on the beacon chain.
    pub fn new(keys: u8) -> Self {
        Self::with_registry(StubChainRegistry::new(), keys)
    }

    pub fn with_registry(registry: StubChainRegistry, keys: u8) -> Self {
        let registry = Arc::new(registry);
        let beacon = Arc::new(StubBeaconSource::new());
        registry.add_operator(operator(), (1..=keys).map(validator).collect());
        for n in 1..=keys {
            beacon.set_status(validator_status(
                pubkey(n),
                u64::from(n),
                BeaconValidatorState::ActiveOngoing,
                false,
            ));
        }
        Self { registry, beacon }
    }

    /// Add a beacon block at `slot` that the execution node agrees on.
    pub fn add_slot(&self, slot: u64, block: u64) {
        self.beacon.add_block(slot, block);
        self.registry.set_block_hash(block, stub_block_hash(block));
    }

    pub fn set_state(&self, n: u8, state: BeaconValidatorState, slashed: bool) {
        self.beacon
            .set_status(validator_status(pubkey(n), u64::from(n), state, slashed));
    }

    pub fn set_vault_balance(&self, n: u8, balance: U256) {
        self.registry.set_balance(vault(n), balance);
    }

    pub fn builder(&self) -> SnapshotBuilder {
        self.builder_for(node_address())
    }

    pub fn builder_for(&self, address: Address) -> SnapshotBuilder {
        SnapshotBuilder::new(self.registry.clone(), self.beacon.clone(), address)
    }
}
