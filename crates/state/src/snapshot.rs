//! Immutable point-in-time view of the operator and the network.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use stader_types::{
    BeaconValidatorStatus, OperatorRecord, RewardCycleDetails, RewardParams, RewardShare,
    ValidatorPubkey, ValidatorRecord,
};

use crate::classifier::{BucketSet, LifecycleBucket};

/// How strongly a snapshot's registry reads are tied to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Every registry read was evaluated at `execution_block`.
    Pinned,
    /// The registry could only serve latest state; figures may straddle
    /// several blocks.
    BestEffort,
}

/// Validators per lifecycle bucket. Buckets overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LifecycleCounts {
    /// Pending activation.
    pub queued: u64,
    /// Active.
    pub active: u64,
    /// Exiting or exited.
    pub exiting: u64,
    /// Slashed.
    pub slashed: u64,
    /// Withdrawable or withdrawn.
    pub withdrawn: u64,
    /// Unknown to the beacon chain.
    pub unknown: u64,
}

impl LifecycleCounts {
    /// Count one validator in every bucket of `buckets`.
    pub fn record(&mut self, buckets: BucketSet) {
        for bucket in buckets.iter() {
            *self.slot_mut(bucket) += 1;
        }
    }

    /// Count for one bucket.
    pub fn get(&self, bucket: LifecycleBucket) -> u64 {
        match bucket {
            LifecycleBucket::Queued => self.queued,
            LifecycleBucket::Active => self.active,
            LifecycleBucket::Exiting => self.exiting,
            LifecycleBucket::Slashed => self.slashed,
            LifecycleBucket::Withdrawn => self.withdrawn,
            LifecycleBucket::Unknown => self.unknown,
        }
    }

    fn slot_mut(&mut self, bucket: LifecycleBucket) -> &mut u64 {
        match bucket {
            LifecycleBucket::Queued => &mut self.queued,
            LifecycleBucket::Active => &mut self.active,
            LifecycleBucket::Exiting => &mut self.exiting,
            LifecycleBucket::Slashed => &mut self.slashed,
            LifecycleBucket::Withdrawn => &mut self.withdrawn,
            LifecycleBucket::Unknown => &mut self.unknown,
        }
    }
}

/// Everything derived for one validator key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    /// Registry record at the snapshot block.
    pub record: ValidatorRecord,
    /// Beacon status at the snapshot slot, `None` if the key is unknown.
    pub beacon: Option<BeaconValidatorStatus>,
    /// Lifecycle buckets the key is counted under.
    pub buckets: BucketSet,
    /// Native balance of the withdraw vault.
    pub vault_balance: U256,
    /// Split of `vault_balance` as rewards.
    pub reward_share: RewardShare,
    /// Vault balance is above the rewards threshold.
    pub crossed_rewards_threshold: bool,
    /// Settlement split, only read when the threshold is crossed.
    pub withdraw_share: Option<RewardShare>,
    /// Cumulative penalty recorded for the key.
    pub penalty: U256,
}

impl ValidatorEntry {
    /// Operator share this key adds to the unclaimed EL rewards sum.
    pub fn unclaimed_operator_rewards(&self) -> U256 {
        if self.crossed_rewards_threshold {
            U256::ZERO
        } else {
            self.reward_share.operator_share
        }
    }
}

/// Socializing-pool rewards owed to the operator.
///
/// No figure is computed yet; every field stays `None` until the merkle
/// reward data is wired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocializingPoolRewards {
    /// Unclaimed ETH.
    pub unclaimed_eth: Option<U256>,
    /// Unclaimed SD.
    pub unclaimed_sd: Option<U256>,
    /// Claimed ETH.
    pub claimed_eth: Option<U256>,
    /// Claimed SD.
    pub claimed_sd: Option<U256>,
}

/// Operator-scoped part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSnapshot {
    /// Registry record.
    pub operator: OperatorRecord,
    /// Keys ever registered.
    pub total_keys: u64,
    /// Keys not in a terminal contract status.
    pub non_terminal_keys: u64,
    /// Execution-layer reward vault (non-socializing operators).
    pub el_reward_vault: Address,
    /// Balance of the EL reward vault.
    pub el_reward_vault_balance: U256,
    /// Split of the EL reward vault balance.
    pub el_rewards: RewardShare,
    /// SD deposited as collateral.
    pub sd_collateral: U256,
    /// Validators the deposited SD can back.
    pub max_validators_spawnable: u64,
    /// Further keys the collateral can back.
    pub spawnable_headroom: u64,
    /// Per-key view, ordered by public key.
    pub validators: BTreeMap<ValidatorPubkey, ValidatorEntry>,
    /// Bucket counters over `validators`.
    pub counts: LifecycleCounts,
    /// Operator share of withdraw vaults at or below the rewards threshold.
    pub unclaimed_el_rewards: U256,
    /// Sum of per-key penalties.
    pub cumulative_penalty: U256,
    /// Socializing-pool rewards.
    pub socializing_pool: SocializingPoolRewards,
}

impl OperatorSnapshot {
    /// Number of keys in the per-validator map.
    pub fn validator_count(&self) -> u64 {
        self.validators.len() as u64
    }
}

/// Network-wide figures read independently of the operator's keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkDetails {
    /// SD per one ETH.
    pub sd_per_eth: U256,
    /// Operators ever registered.
    pub total_operators: u64,
    /// Validators ever registered.
    pub total_validators: u64,
    /// Validators the registry counts as active.
    pub active_validators: u64,
    /// Validators in the registry's deposit queue.
    pub queued_validators: u64,
    /// SD staked as collateral.
    pub total_sd_collateral: U256,
    /// ETHx supply.
    pub ethx_supply: U256,
    /// ETH staked by users.
    pub total_staked_by_users: U256,
    /// ETH staked by operators as validator collateral.
    pub total_staked_by_operators: U256,
    /// Current reward cycle of the socializing pool.
    pub reward_cycle: RewardCycleDetails,
    /// Operator ETH still unclaimed in the socializing pool.
    pub socializing_pool_eth_remaining: U256,
    /// Operator SD still unclaimed in the socializing pool.
    pub socializing_pool_sd_remaining: U256,
}

impl NetworkDetails {
    /// First block of the next reward cycle.
    pub fn next_reward_block(&self) -> u64 {
        self.reward_cycle.current_end_block.saturating_add(1)
    }
}

/// One consistent aggregation at a (block, slot) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Beacon slot the snapshot is anchored to.
    pub beacon_slot: u64,
    /// Execution block canonical at `beacon_slot`.
    pub execution_block: u64,
    /// Hash of `execution_block`.
    pub execution_block_hash: B256,
    /// Read consistency achieved.
    pub consistency: Consistency,
    /// Build completion time, unix seconds.
    pub built_at: u64,
    /// Node address the operator view was built for.
    pub node_address: Address,
    /// Parameters every reward split in this snapshot used.
    pub reward_params: RewardParams,
    /// Rewards threshold every vault was compared against.
    pub rewards_threshold: U256,
    /// Network-wide figures.
    pub network: NetworkDetails,
    /// Operator view, `None` when the node address is not registered.
    pub operator: Option<OperatorSnapshot>,
}

impl NetworkSnapshot {
    /// Whether the snapshot was built without pinned reads.
    pub fn is_degraded(&self) -> bool {
        self.consistency == Consistency::BestEffort
    }

    /// Bucket counters of the operator's keys (zero when unregistered).
    pub fn lifecycle_counts(&self) -> LifecycleCounts {
        self.operator
            .as_ref()
            .map(|op| op.counts)
            .unwrap_or_default()
    }

    /// Per-key entry lookup.
    pub fn validator(&self, pubkey: &ValidatorPubkey) -> Option<&ValidatorEntry> {
        self.operator.as_ref()?.validators.get(pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_record_overlap() {
        let mut counts = LifecycleCounts::default();
        counts.record(
            [LifecycleBucket::Exiting, LifecycleBucket::Slashed]
                .into_iter()
                .collect(),
        );
        counts.record([LifecycleBucket::Active].into_iter().collect());

        assert_eq!(counts.exiting, 1);
        assert_eq!(counts.slashed, 1);
        assert_eq!(counts.active, 1);
        assert_eq!(counts.get(LifecycleBucket::Queued), 0);
    }

    #[test]
    fn test_next_reward_block() {
        let details = NetworkDetails {
            reward_cycle: RewardCycleDetails {
                current_index: 3,
                current_start_block: 100,
                current_end_block: 199,
            },
            ..Default::default()
        };
        assert_eq!(details.next_reward_block(), 200);
    }
}
