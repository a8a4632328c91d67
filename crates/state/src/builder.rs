//! Snapshot builder.
//!
//! Resolves a beacon slot to its execution block, pins every registry read
//! to that block and fans out over the operator's keys with a bounded number
//! of requests in flight. Any failed read aborts the build; nothing is
//! retried here.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, U256};
use futures::stream::{self, StreamExt, TryStreamExt};
use stader_chain::{BeaconSource, BlockTag, ChainRegistry};
use stader_types::{
    BeaconValidatorStatus, ExecutionBlockRef, OperatorId, PoolId, RewardParams, ValidatorRecord,
    PERMISSIONLESS_POOL_ID,
};
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::error::{ChainResultExt, Result, StateError};
use crate::rewards::{counts_as_rewards, reward_share};
use crate::snapshot::{
    Consistency, LifecycleCounts, NetworkDetails, NetworkSnapshot, OperatorSnapshot,
    SocializingPoolRewards, ValidatorEntry,
};

/// Default cap on concurrent per-key reads.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Parameters shared by every read of one build.
struct BuildContext {
    slot: u64,
    at: BlockTag,
    params: RewardParams,
    rewards_threshold: U256,
}

/// Builds [`NetworkSnapshot`]s from a registry and a beacon source.
pub struct SnapshotBuilder {
    registry: Arc<dyn ChainRegistry>,
    beacon: Arc<dyn BeaconSource>,
    node_address: Address,
    pool_id: PoolId,
    max_concurrency: usize,
}

impl SnapshotBuilder {
    /// Create a builder for the operator registered from `node_address`.
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        beacon: Arc<dyn BeaconSource>,
        node_address: Address,
    ) -> Self {
        Self {
            registry,
            beacon,
            node_address,
            pool_id: PERMISSIONLESS_POOL_ID,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Cap the number of per-key reads in flight (minimum 1).
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Node address the operator view is built for.
    pub fn node_address(&self) -> Address {
        self.node_address
    }

    /// Beacon source this builder resolves slots with.
    pub fn beacon(&self) -> &Arc<dyn BeaconSource> {
        &self.beacon
    }

    /// Build one snapshot anchored at `slot`.
    ///
    /// Fails with [`StateError::SlotNotFound`] when the slot has no block and
    /// with [`StateError::InconsistentPairing`] when the execution node does
    /// not agree with the beacon node about the block at that slot.
    pub async fn build_snapshot(&self, slot: u64) -> Result<NetworkSnapshot> {
        let started = Instant::now();
        let block = self.resolve_block(slot).await?;
        info!(
            slot,
            block = block.block_number,
            "Building snapshot"
        );

        let (at, consistency) = if self.registry.supports_historical_reads() {
            (BlockTag::Number(block.block_number), Consistency::Pinned)
        } else {
            warn!(
                slot,
                block = block.block_number,
                "Registry serves latest state only, snapshot is best-effort"
            );
            (BlockTag::Latest, Consistency::BestEffort)
        };

        let (params, rewards_threshold) = tokio::try_join!(
            async {
                self.registry
                    .reward_params(self.pool_id, at)
                    .await
                    .upstream(|| format!("reward params for pool {}", self.pool_id))
            },
            async {
                self.registry
                    .rewards_threshold(at)
                    .await
                    .upstream(|| "rewards threshold")
            },
        )?;
        let ctx = BuildContext {
            slot,
            at,
            params,
            rewards_threshold,
        };

        let (network, operator) =
            tokio::try_join!(self.network_details(&ctx), self.operator_view(&ctx))?;

        let snapshot = NetworkSnapshot {
            beacon_slot: slot,
            execution_block: block.block_number,
            execution_block_hash: block.block_hash,
            consistency,
            built_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            node_address: self.node_address,
            reward_params: ctx.params,
            rewards_threshold: ctx.rewards_threshold,
            network,
            operator,
        };

        info!(
            slot,
            block = block.block_number,
            validators = snapshot.operator.as_ref().map_or(0, |op| op.validators.len()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot built"
        );
        Ok(snapshot)
    }

    /// Resolve `slot` and check the execution node agrees on the block.
    async fn resolve_block(&self, slot: u64) -> Result<ExecutionBlockRef> {
        let block = self
            .beacon
            .execution_block_at_slot(slot)
            .await
            .upstream(|| format!("beacon block at slot {slot}"))?
            .ok_or(StateError::SlotNotFound { slot })?;

        if block.slot != slot {
            return Err(StateError::InconsistentPairing {
                slot,
                execution_block: block.block_number,
                reason: format!("beacon returned block for slot {}", block.slot),
            });
        }

        let hash = self
            .registry
            .block_hash(block.block_number)
            .await
            .upstream(|| format!("execution block {}", block.block_number))?;
        match hash {
            Some(hash) if hash == block.block_hash => Ok(block),
            Some(hash) => Err(StateError::InconsistentPairing {
                slot,
                execution_block: block.block_number,
                reason: format!(
                    "beacon payload hash {} but execution node has {}",
                    block.block_hash, hash
                ),
            }),
            None => Err(StateError::InconsistentPairing {
                slot,
                execution_block: block.block_number,
                reason: "execution node does not have the block".to_string(),
            }),
        }
    }

    async fn network_details(&self, ctx: &BuildContext) -> Result<NetworkDetails> {
        let at = ctx.at;
        let registry = &self.registry;
        let (
            sd_per_eth,
            next_operator_id,
            next_validator_id,
            active_validators,
            queued_validators,
            total_sd_collateral,
            ethx_supply,
            total_staked_by_users,
            reward_cycle,
            remaining,
        ) = tokio::try_join!(
            async { registry.sd_per_eth(at).await.upstream(|| "SD price") },
            async { registry.next_operator_id(at).await.upstream(|| "next operator id") },
            async { registry.next_validator_id(at).await.upstream(|| "next validator id") },
            async {
                registry
                    .total_active_validators(at)
                    .await
                    .upstream(|| "active validator count")
            },
            async {
                registry
                    .total_queued_validators(at)
                    .await
                    .upstream(|| "queued validator count")
            },
            async {
                registry
                    .total_sd_collateral(at)
                    .await
                    .upstream(|| "total SD collateral")
            },
            async { registry.ethx_supply(at).await.upstream(|| "ETHx supply") },
            async {
                registry
                    .total_staked_assets(at)
                    .await
                    .upstream(|| "stake pool total assets")
            },
            async { registry.reward_cycle(at).await.upstream(|| "reward cycle") },
            async {
                registry
                    .socializing_pool_remaining(at)
                    .await
                    .upstream(|| "socializing pool remaining rewards")
            },
        )?;

        let total_validators = next_validator_id.saturating_sub(1);
        Ok(NetworkDetails {
            sd_per_eth,
            total_operators: next_operator_id.saturating_sub(1),
            total_validators,
            active_validators,
            queued_validators,
            total_sd_collateral,
            ethx_supply,
            total_staked_by_users,
            total_staked_by_operators: U256::from(total_validators) * ctx.params.collateral_eth,
            reward_cycle,
            socializing_pool_eth_remaining: remaining.eth,
            socializing_pool_sd_remaining: remaining.sd,
        })
    }

    async fn operator_view(&self, ctx: &BuildContext) -> Result<Option<OperatorSnapshot>> {
        let at = ctx.at;
        let address = self.node_address;
        let operator_id = self
            .registry
            .operator_id_by_address(address, at)
            .await
            .upstream(|| format!("operator id of {address}"))?;
        if operator_id == 0 {
            debug!(%address, "Node address is not a registered operator");
            return Ok(None);
        }

        let (operator, total_keys, el_reward_vault, sd_collateral) = tokio::try_join!(
            async {
                self.registry
                    .operator_by_id(operator_id, at)
                    .await
                    .upstream(|| format!("operator {operator_id}"))
            },
            async {
                self.registry
                    .operator_total_keys(operator_id, at)
                    .await
                    .upstream(|| format!("key count of operator {operator_id}"))
            },
            async {
                self.registry
                    .operator_el_reward_vault(operator_id, at)
                    .await
                    .upstream(|| format!("EL reward vault of operator {operator_id}"))
            },
            async {
                self.registry
                    .operator_sd_collateral(address, at)
                    .await
                    .upstream(|| format!("SD collateral of {address}"))
            },
        )?;

        let (el_reward_vault_balance, max_validators_spawnable) = tokio::try_join!(
            async {
                self.registry
                    .balance(el_reward_vault, at)
                    .await
                    .upstream(|| format!("EL reward vault balance of operator {operator_id}"))
            },
            async {
                self.registry
                    .max_validators_for_collateral(sd_collateral, self.pool_id, at)
                    .await
                    .upstream(|| format!("spawnable validators of operator {operator_id}"))
            },
        )?;

        let records: Vec<ValidatorRecord> = stream::iter(0..total_keys)
            .map(|index| self.fetch_record(operator_id, index, at))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        let pubkeys: Vec<_> = records.iter().map(|record| record.pubkey).collect();
        let mut statuses = self
            .beacon
            .validator_statuses(&pubkeys, ctx.slot)
            .await
            .upstream(|| {
                format!(
                    "beacon statuses of {} keys of operator {operator_id} at slot {}",
                    pubkeys.len(),
                    ctx.slot
                )
            })?;

        let entries: Vec<ValidatorEntry> = stream::iter(records)
            .map(|record| {
                let beacon = statuses.remove(&record.pubkey);
                self.fetch_entry(record, beacon, ctx)
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        let mut counts = LifecycleCounts::default();
        let mut unclaimed_el_rewards = U256::ZERO;
        let mut cumulative_penalty = U256::ZERO;
        let mut non_terminal_keys = 0u64;
        let mut validators = BTreeMap::new();
        for entry in entries {
            counts.record(entry.buckets);
            unclaimed_el_rewards += entry.unclaimed_operator_rewards();
            cumulative_penalty += entry.penalty;
            if !entry.record.status.is_terminal() {
                non_terminal_keys += 1;
            }
            validators.insert(entry.record.pubkey, entry);
        }

        Ok(Some(OperatorSnapshot {
            operator,
            total_keys,
            non_terminal_keys,
            el_reward_vault,
            el_reward_vault_balance,
            el_rewards: reward_share(el_reward_vault_balance, &ctx.params),
            sd_collateral,
            max_validators_spawnable,
            spawnable_headroom: max_validators_spawnable.saturating_sub(non_terminal_keys),
            validators,
            counts,
            unclaimed_el_rewards,
            cumulative_penalty,
            socializing_pool: SocializingPoolRewards::default(),
        }))
    }

    async fn fetch_record(
        &self,
        operator_id: OperatorId,
        index: u64,
        at: BlockTag,
    ) -> Result<ValidatorRecord> {
        let id = self
            .registry
            .validator_id_by_operator(operator_id, index, at)
            .await
            .upstream(|| format!("validator id at index {index} of operator {operator_id}"))?;
        self.registry
            .validator_by_id(id, at)
            .await
            .upstream(|| format!("validator {id} of operator {operator_id}"))?
            .ok_or(StateError::ValidatorNotFound { operator_id, index })
    }

    async fn fetch_entry(
        &self,
        record: ValidatorRecord,
        beacon: Option<BeaconValidatorStatus>,
        ctx: &BuildContext,
    ) -> Result<ValidatorEntry> {
        let at = ctx.at;
        let pubkey = record.pubkey;
        let vault = record.withdraw_vault;
        let (vault_balance, penalty) = tokio::try_join!(
            async {
                self.registry
                    .balance(vault, at)
                    .await
                    .upstream(|| format!("withdraw vault balance of {pubkey}"))
            },
            async {
                self.registry
                    .cumulative_penalty(pubkey, at)
                    .await
                    .upstream(|| format!("cumulative penalty of {pubkey}"))
            },
        )?;

        let crossed_rewards_threshold = !counts_as_rewards(vault_balance, ctx.rewards_threshold);
        let withdraw_share = if crossed_rewards_threshold {
            let share = self
                .registry
                .vault_withdraw_share(vault, at)
                .await
                .upstream(|| format!("withdraw share of {pubkey}"))?;
            Some(share)
        } else {
            None
        };

        Ok(ValidatorEntry {
            buckets: classify(beacon.as_ref()),
            beacon,
            vault_balance,
            reward_share: reward_share(vault_balance, &ctx.params),
            crossed_rewards_threshold,
            withdraw_share,
            penalty,
            record,
        })
    }
}
