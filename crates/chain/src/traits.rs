//! Collaborator interfaces consumed by the state aggregation engine.
//!
//! Both traits are object safe so the engine can hold them as
//! `Arc<dyn ChainRegistry>` / `Arc<dyn BeaconSource>` and tests can swap in
//! the in-memory stubs.

use std::collections::HashMap;
use std::fmt;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use stader_types::{
    BeaconValidatorStatus, ExecutionBlockRef, OperatorId, OperatorRecord, PoolId,
    RewardCycleDetails, RewardParams, RewardShare, ValidatorId, ValidatorPubkey, ValidatorRecord,
};

use crate::error::ChainResult;

/// Execution block a registry read is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    /// A specific block number.
    Number(u64),
    /// Whatever the node considers latest.
    #[default]
    Latest,
}

impl BlockTag {
    /// JSON-RPC block parameter (`"0x…"` or `"latest"`).
    pub fn to_rpc_param(self) -> String {
        match self {
            Self::Number(n) => format!("0x{n:x}"),
            Self::Latest => "latest".to_string(),
        }
    }
}

impl From<u64> for BlockTag {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Latest => f.write_str("latest"),
        }
    }
}

/// Which beacon slot the refresher should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotTag {
    /// Current head slot.
    Head,
    /// Most recent finalized slot.
    #[default]
    Finalized,
}

impl SlotTag {
    /// Beacon API block id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Finalized => "finalized",
        }
    }
}

/// Operator ETH and SD still owed by the socializing pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocializingPoolRemaining {
    /// ETH rewards not yet claimed by operators (wei).
    pub eth: U256,
    /// SD rewards not yet claimed by operators (wei).
    pub sd: U256,
}

/// Typed read access to the on-chain registry and its satellite contracts.
///
/// One method per view function. Every read takes the block it must be
/// evaluated at; implementations without archive access report that through
/// [`ChainRegistry::supports_historical_reads`] and may ignore the tag.
#[async_trait]
pub trait ChainRegistry: Send + Sync {
    /// Whether reads honor `BlockTag::Number` (archive access).
    fn supports_historical_reads(&self) -> bool;

    /// Hash of an execution block, `None` if the node does not know it.
    async fn block_hash(&self, number: u64) -> ChainResult<Option<B256>>;

    /// Operator id registered for `address` (0 when unregistered).
    async fn operator_id_by_address(&self, address: Address, at: BlockTag)
        -> ChainResult<OperatorId>;

    /// Operator record by id.
    async fn operator_by_id(&self, id: OperatorId, at: BlockTag) -> ChainResult<OperatorRecord>;

    /// Number of keys an operator ever registered.
    async fn operator_total_keys(&self, id: OperatorId, at: BlockTag) -> ChainResult<u64>;

    /// Validator id stored at `index` of the operator's key list.
    async fn validator_id_by_operator(
        &self,
        operator_id: OperatorId,
        index: u64,
        at: BlockTag,
    ) -> ChainResult<ValidatorId>;

    /// Validator record by id, `None` if the id is unassigned.
    async fn validator_by_id(
        &self,
        id: ValidatorId,
        at: BlockTag,
    ) -> ChainResult<Option<ValidatorRecord>>;

    /// Execution-layer reward vault of a non-socializing operator.
    async fn operator_el_reward_vault(
        &self,
        operator_id: OperatorId,
        at: BlockTag,
    ) -> ChainResult<Address>;

    /// Native balance of any address.
    async fn balance(&self, address: Address, at: BlockTag) -> ChainResult<U256>;

    /// Fee and collateral parameters for a pool.
    async fn reward_params(&self, pool_id: PoolId, at: BlockTag) -> ChainResult<RewardParams>;

    /// Vault balance above which the vault is assumed to hold exit principal.
    async fn rewards_threshold(&self, at: BlockTag) -> ChainResult<U256>;

    /// Socializing pool reward cycle pointer.
    async fn reward_cycle(&self, at: BlockTag) -> ChainResult<RewardCycleDetails>;

    /// Operator ETH/SD still unclaimed in the socializing pool.
    async fn socializing_pool_remaining(&self, at: BlockTag)
        -> ChainResult<SocializingPoolRemaining>;

    /// Cumulative penalty recorded for a validator.
    async fn cumulative_penalty(&self, pubkey: ValidatorPubkey, at: BlockTag) -> ChainResult<U256>;

    /// Settlement split of a withdraw vault that holds exit principal.
    async fn vault_withdraw_share(&self, vault: Address, at: BlockTag) -> ChainResult<RewardShare>;

    /// SD collateral deposited by an operator.
    async fn operator_sd_collateral(&self, operator: Address, at: BlockTag) -> ChainResult<U256>;

    /// Validators an SD amount can collateralize in a pool.
    async fn max_validators_for_collateral(
        &self,
        sd_amount: U256,
        pool_id: PoolId,
        at: BlockTag,
    ) -> ChainResult<u64>;

    /// Next operator id to be assigned.
    async fn next_operator_id(&self, at: BlockTag) -> ChainResult<u64>;

    /// Next validator id to be assigned.
    async fn next_validator_id(&self, at: BlockTag) -> ChainResult<u64>;

    /// Validators the registry counts as active.
    async fn total_active_validators(&self, at: BlockTag) -> ChainResult<u64>;

    /// Validators waiting in the registry's deposit queue.
    async fn total_queued_validators(&self, at: BlockTag) -> ChainResult<u64>;

    /// Total SD held as collateral.
    async fn total_sd_collateral(&self, at: BlockTag) -> ChainResult<U256>;

    /// ETHx total supply.
    async fn ethx_supply(&self, at: BlockTag) -> ChainResult<U256>;

    /// ETH staked by users (stake pool manager total assets).
    async fn total_staked_assets(&self, at: BlockTag) -> ChainResult<U256>;

    /// SD received for one ether.
    async fn sd_per_eth(&self, at: BlockTag) -> ChainResult<U256>;
}

/// Typed read access to a consensus-layer node.
#[async_trait]
pub trait BeaconSource: Send + Sync {
    /// Slot number of the head or finalized block.
    async fn slot(&self, tag: SlotTag) -> ChainResult<u64>;

    /// Execution block carried by the block at `slot`.
    ///
    /// `Ok(None)` when the slot has no block (missed or not yet produced).
    async fn execution_block_at_slot(&self, slot: u64) -> ChainResult<Option<ExecutionBlockRef>>;

    /// Statuses of `pubkeys` at `slot`.
    ///
    /// Keys unknown to the beacon chain are absent from the map.
    async fn validator_statuses(
        &self,
        pubkeys: &[ValidatorPubkey],
        slot: u64,
    ) -> ChainResult<HashMap<ValidatorPubkey, BeaconValidatorStatus>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tag_rpc_param() {
        assert_eq!(BlockTag::Number(255).to_rpc_param(), "0xff");
        assert_eq!(BlockTag::Latest.to_rpc_param(), "latest");
        assert_eq!(BlockTag::from(1u64), BlockTag::Number(1));
        assert_eq!(BlockTag::default(), BlockTag::Latest);
    }

    #[test]
    fn test_slot_tag() {
        assert_eq!(SlotTag::default(), SlotTag::Finalized);
        assert_eq!(SlotTag::Head.as_str(), "head");
    }
}
