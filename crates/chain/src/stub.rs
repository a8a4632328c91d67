//! In-memory collaborators for tests and dry runs.
//!
//! Both stubs keep their data behind a `parking_lot::RwLock` so tests can
//! mutate upstream state through a shared `Arc` between builds. Every call
//! is counted, can be delayed, and can be made to fail per method.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use stader_types::units::eth;
use stader_types::{
    BeaconValidatorState, BeaconValidatorStatus, ExecutionBlockRef, OperatorId, OperatorRecord,
    PoolId, RewardCycleDetails, RewardParams, RewardShare, ValidatorId, ValidatorPubkey,
    ValidatorRecord, PERMISSIONLESS_POOL_ID,
};
use tracing::trace;

use crate::error::{ChainError, ChainResult};
use crate::traits::{BeaconSource, BlockTag, ChainRegistry, SlotTag, SocializingPoolRemaining};

/// Deterministic block hash used by the stubs when pairing slots and blocks.
pub fn stub_block_hash(number: u64) -> B256 {
    B256::left_padding_from(&number.to_be_bytes())
}

/// Build a beacon status with unset epochs and a 32 ETH balance.
pub fn validator_status(
    pubkey: ValidatorPubkey,
    index: u64,
    state: BeaconValidatorState,
    slashed: bool,
) -> BeaconValidatorStatus {
    BeaconValidatorStatus {
        pubkey,
        index,
        state,
        slashed,
        balance_gwei: 32_000_000_000,
        activation_epoch: u64::MAX,
        exit_epoch: u64::MAX,
        withdrawable_epoch: u64::MAX,
    }
}

/// Call bookkeeping shared by both stubs.
#[derive(Default)]
struct CallControl {
    calls: AtomicU64,
    delay: RwLock<Option<Duration>>,
    failures: RwLock<HashMap<&'static str, ChainError>>,
    methods: Mutex<HashMap<&'static str, MethodStats>>,
}

#[derive(Default)]
struct MethodStats {
    calls: u64,
    in_flight: u64,
    max_in_flight: u64,
}

/// Decrements the in-flight count of a method when dropped.
struct InFlight<'a> {
    control: &'a CallControl,
    method: &'static str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(stats) = self.control.methods.lock().get_mut(self.method) {
            stats.in_flight -= 1;
        }
    }
}

impl CallControl {
    async fn enter(&self, method: &'static str) -> ChainResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let _in_flight = {
            let mut methods = self.methods.lock();
            let stats = methods.entry(method).or_default();
            stats.calls += 1;
            stats.in_flight += 1;
            stats.max_in_flight = stats.max_in_flight.max(stats.in_flight);
            InFlight {
                control: self,
                method,
            }
        };
        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.read().get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn max_in_flight(&self, method: &str) -> u64 {
        self.methods.lock().get(method).map_or(0, |s| s.max_in_flight)
    }

    fn calls_to(&self, method: &str) -> u64 {
        self.methods.lock().get(method).map_or(0, |s| s.calls)
    }
}

// ============================================================================
// Chain registry
// ============================================================================

#[derive(Debug, Clone)]
struct RegistryState {
    block_hashes: HashMap<u64, B256>,
    operator_ids: HashMap<Address, OperatorId>,
    operators: HashMap<OperatorId, OperatorRecord>,
    operator_keys: HashMap<OperatorId, Vec<ValidatorId>>,
    validators: HashMap<ValidatorId, ValidatorRecord>,
    el_reward_vaults: HashMap<OperatorId, Address>,
    balances: HashMap<Address, U256>,
    reward_params: RewardParams,
    rewards_threshold: U256,
    reward_cycle: RewardCycleDetails,
    socializing_remaining: SocializingPoolRemaining,
    penalties: HashMap<ValidatorPubkey, U256>,
    withdraw_shares: HashMap<Address, RewardShare>,
    sd_collateral: HashMap<Address, U256>,
    sd_per_validator: U256,
    next_operator_id: u64,
    next_validator_id: u64,
    total_active: u64,
    total_queued: u64,
    total_sd_collateral: U256,
    ethx_supply: U256,
    total_staked_assets: U256,
    sd_per_eth: U256,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            block_hashes: HashMap::new(),
            operator_ids: HashMap::new(),
            operators: HashMap::new(),
            operator_keys: HashMap::new(),
            validators: HashMap::new(),
            el_reward_vaults: HashMap::new(),
            balances: HashMap::new(),
            reward_params: RewardParams {
                pool_id: PERMISSIONLESS_POOL_ID,
                staked_eth_per_node: eth(32),
                collateral_eth: eth(4),
                protocol_fee_bps: U256::from(500),
                operator_fee_bps: U256::from(500),
            },
            rewards_threshold: eth(8),
            reward_cycle: RewardCycleDetails::default(),
            socializing_remaining: SocializingPoolRemaining::default(),
            penalties: HashMap::new(),
            withdraw_shares: HashMap::new(),
            sd_collateral: HashMap::new(),
            sd_per_validator: eth(1_000),
            next_operator_id: 1,
            next_validator_id: 1,
            total_active: 0,
            total_queued: 0,
            total_sd_collateral: U256::ZERO,
            ethx_supply: U256::ZERO,
            total_staked_assets: U256::ZERO,
            sd_per_eth: eth(1_000),
        }
    }
}

/// In-memory [`ChainRegistry`].
///
/// Historical reads are reported as supported unless the stub is built with
/// [`StubChainRegistry::without_history`]. Every block tag the registry is
/// asked to read at is recorded and available via
/// [`StubChainRegistry::observed_tags`].
#[derive(Default)]
pub struct StubChainRegistry {
    state: RwLock<RegistryState>,
    control: CallControl,
    latest_only: bool,
    tags: Mutex<Vec<BlockTag>>,
}

impl StubChainRegistry {
    /// Create an empty registry with permissionless-pool defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that only serves latest state.
    pub fn without_history() -> Self {
        Self {
            latest_only: true,
            ..Self::default()
        }
    }

    /// Register an operator and its validators, in key order.
    ///
    /// Validator ids are taken from the records; `next_validator_id` and
    /// `next_operator_id` are bumped past them.
    pub fn add_operator(&self, operator: OperatorRecord, validators: Vec<ValidatorRecord>) {
        let mut state = self.state.write();
        let id = operator.id;
        state.operator_ids.insert(operator.operator_address, id);
        state.next_operator_id = state.next_operator_id.max(id + 1);
        let keys = state.operator_keys.entry(id).or_default();
        for validator in &validators {
            keys.push(validator.id);
        }
        for validator in validators {
            state.next_validator_id = state.next_validator_id.max(validator.id + 1);
            state.validators.insert(validator.id, validator);
        }
        state.operators.insert(id, operator);
    }

    /// Remove a validator record while leaving its key index in place.
    pub fn remove_validator(&self, id: ValidatorId) {
        self.state.write().validators.remove(&id);
    }

    /// Make `number` a known block.
    pub fn set_block_hash(&self, number: u64, hash: B256) {
        self.state.write().block_hashes.insert(number, hash);
    }

    /// Set the native balance of an address.
    pub fn set_balance(&self, address: Address, balance: U256) {
        self.state.write().balances.insert(address, balance);
    }

    /// Set an operator's EL reward vault.
    pub fn set_el_reward_vault(&self, operator_id: OperatorId, vault: Address) {
        self.state.write().el_reward_vaults.insert(operator_id, vault);
    }

    /// Set the reward split parameters.
    pub fn set_reward_params(&self, params: RewardParams) {
        self.state.write().reward_params = params;
    }

    /// Set the rewards threshold.
    pub fn set_rewards_threshold(&self, threshold: U256) {
        self.state.write().rewards_threshold = threshold;
    }

    /// Set the reward cycle pointer.
    pub fn set_reward_cycle(&self, cycle: RewardCycleDetails) {
        self.state.write().reward_cycle = cycle;
    }

    /// Set socializing-pool remaining rewards.
    pub fn set_socializing_remaining(&self, remaining: SocializingPoolRemaining) {
        self.state.write().socializing_remaining = remaining;
    }

    /// Set the cumulative penalty of a validator.
    pub fn set_penalty(&self, pubkey: ValidatorPubkey, penalty: U256) {
        self.state.write().penalties.insert(pubkey, penalty);
    }

    /// Set the settlement split returned for a withdraw vault.
    pub fn set_withdraw_share(&self, vault: Address, share: RewardShare) {
        self.state.write().withdraw_shares.insert(vault, share);
    }

    /// Set an operator's SD collateral.
    pub fn set_sd_collateral(&self, operator: Address, amount: U256) {
        self.state.write().sd_collateral.insert(operator, amount);
    }

    /// Set SD required per validator.
    pub fn set_sd_per_validator(&self, amount: U256) {
        self.state.write().sd_per_validator = amount;
    }

    /// Set network counters.
    pub fn set_network_counts(&self, total_active: u64, total_queued: u64) {
        let mut state = self.state.write();
        state.total_active = total_active;
        state.total_queued = total_queued;
    }

    /// Set network totals.
    pub fn set_network_totals(
        &self,
        total_sd_collateral: U256,
        ethx_supply: U256,
        total_staked_assets: U256,
        sd_per_eth: U256,
    ) {
        let mut state = self.state.write();
        state.total_sd_collateral = total_sd_collateral;
        state.ethx_supply = ethx_supply;
        state.total_staked_assets = total_staked_assets;
        state.sd_per_eth = sd_per_eth;
    }

    /// Make every call to `method` fail with `err`.
    pub fn fail_method(&self, method: &'static str, err: ChainError) {
        self.control.failures.write().insert(method, err);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.control.failures.write().clear();
    }

    /// Delay every call by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.control.delay.write() = delay;
    }

    /// Number of calls served so far.
    pub fn call_count(&self) -> u64 {
        self.control.calls.load(Ordering::Relaxed)
    }

    /// Most concurrent calls to `method` observed.
    pub fn max_in_flight(&self, method: &str) -> u64 {
        self.control.max_in_flight(method)
    }

    /// Calls made to `method`.
    pub fn calls_to(&self, method: &str) -> u64 {
        self.control.calls_to(method)
    }

    /// Distinct block tags reads were evaluated at.
    pub fn observed_tags(&self) -> Vec<BlockTag> {
        let mut tags = self.tags.lock().clone();
        tags.dedup();
        tags
    }

    async fn read(&self, method: &'static str, at: BlockTag) -> ChainResult<()> {
        trace!("StubChainRegistry::{}({})", method, at);
        self.tags.lock().push(at);
        self.control.enter(method).await
    }
}

#[async_trait]
impl ChainRegistry for StubChainRegistry {
    fn supports_historical_reads(&self) -> bool {
        !self.latest_only
    }

    async fn block_hash(&self, number: u64) -> ChainResult<Option<B256>> {
        trace!("StubChainRegistry::block_hash({})", number);
        self.control.enter("block_hash").await?;
        Ok(self.state.read().block_hashes.get(&number).copied())
    }

    async fn operator_id_by_address(
        &self,
        address: Address,
        at: BlockTag,
    ) -> ChainResult<OperatorId> {
        self.read("operator_id_by_address", at).await?;
        Ok(self.state.read().operator_ids.get(&address).copied().unwrap_or(0))
    }

    async fn operator_by_id(&self, id: OperatorId, at: BlockTag) -> ChainResult<OperatorRecord> {
        self.read("operator_by_id", at).await?;
        Ok(self
            .state
            .read()
            .operators
            .get(&id)
            .cloned()
            .unwrap_or_else(|| OperatorRecord::unregistered(id)))
    }

    async fn operator_total_keys(&self, id: OperatorId, at: BlockTag) -> ChainResult<u64> {
        self.read("operator_total_keys", at).await?;
        Ok(self
            .state
            .read()
            .operator_keys
            .get(&id)
            .map_or(0, |keys| keys.len() as u64))
    }

    async fn validator_id_by_operator(
        &self,
        operator_id: OperatorId,
        index: u64,
        at: BlockTag,
    ) -> ChainResult<ValidatorId> {
        self.read("validator_id_by_operator", at).await?;
        self.state
            .read()
            .operator_keys
            .get(&operator_id)
            .and_then(|keys| keys.get(index as usize).copied())
            .ok_or_else(|| {
                ChainError::Reverted(format!("no key {index} for operator {operator_id}"))
            })
    }

    async fn validator_by_id(
        &self,
        id: ValidatorId,
        at: BlockTag,
    ) -> ChainResult<Option<ValidatorRecord>> {
        self.read("validator_by_id", at).await?;
        Ok(self.state.read().validators.get(&id).cloned())
    }

    async fn operator_el_reward_vault(
        &self,
        operator_id: OperatorId,
        at: BlockTag,
    ) -> ChainResult<Address> {
        self.read("operator_el_reward_vault", at).await?;
        Ok(self
            .state
            .read()
            .el_reward_vaults
            .get(&operator_id)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn balance(&self, address: Address, at: BlockTag) -> ChainResult<U256> {
        self.read("balance", at).await?;
        Ok(self.state.read().balances.get(&address).copied().unwrap_or_default())
    }

    async fn reward_params(&self, pool_id: PoolId, at: BlockTag) -> ChainResult<RewardParams> {
        self.read("reward_params", at).await?;
        let params = self.state.read().reward_params;
        Ok(RewardParams { pool_id, ..params })
    }

    async fn rewards_threshold(&self, at: BlockTag) -> ChainResult<U256> {
        self.read("rewards_threshold", at).await?;
        Ok(self.state.read().rewards_threshold)
    }

    async fn reward_cycle(&self, at: BlockTag) -> ChainResult<RewardCycleDetails> {
        self.read("reward_cycle", at).await?;
        Ok(self.state.read().reward_cycle)
    }

    async fn socializing_pool_remaining(
        &self,
        at: BlockTag,
    ) -> ChainResult<SocializingPoolRemaining> {
        self.read("socializing_pool_remaining", at).await?;
        Ok(self.state.read().socializing_remaining)
    }

    async fn cumulative_penalty(&self, pubkey: ValidatorPubkey, at: BlockTag) -> ChainResult<U256> {
        self.read("cumulative_penalty", at).await?;
        Ok(self.state.read().penalties.get(&pubkey).copied().unwrap_or_default())
    }

    async fn vault_withdraw_share(&self, vault: Address, at: BlockTag) -> ChainResult<RewardShare> {
        self.read("vault_withdraw_share", at).await?;
        Ok(self
            .state
            .read()
            .withdraw_shares
            .get(&vault)
            .copied()
            .unwrap_or_default())
    }

    async fn operator_sd_collateral(&self, operator: Address, at: BlockTag) -> ChainResult<U256> {
        self.read("operator_sd_collateral", at).await?;
        Ok(self
            .state
            .read()
            .sd_collateral
            .get(&operator)
            .copied()
            .unwrap_or_default())
    }

    async fn max_validators_for_collateral(
        &self,
        sd_amount: U256,
        _pool_id: PoolId,
        at: BlockTag,
    ) -> ChainResult<u64> {
        self.read("max_validators_for_collateral", at).await?;
        let per_validator = self.state.read().sd_per_validator;
        if per_validator.is_zero() {
            return Ok(0);
        }
        Ok(u64::try_from(sd_amount / per_validator).unwrap_or(u64::MAX))
    }

    async fn next_operator_id(&self, at: BlockTag) -> ChainResult<u64> {
        self.read("next_operator_id", at).await?;
        Ok(self.state.read().next_operator_id)
    }

    async fn next_validator_id(&self, at: BlockTag) -> ChainResult<u64> {
        self.read("next_validator_id", at).await?;
        Ok(self.state.read().next_validator_id)
    }

    async fn total_active_validators(&self, at: BlockTag) -> ChainResult<u64> {
        self.read("total_active_validators", at).await?;
        Ok(self.state.read().total_active)
    }

    async fn total_queued_validators(&self, at: BlockTag) -> ChainResult<u64> {
        self.read("total_queued_validators", at).await?;
        Ok(self.state.read().total_queued)
    }

    async fn total_sd_collateral(&self, at: BlockTag) -> ChainResult<U256> {
        self.read("total_sd_collateral", at).await?;
        Ok(self.state.read().total_sd_collateral)
    }

    async fn ethx_supply(&self, at: BlockTag) -> ChainResult<U256> {
        self.read("ethx_supply", at).await?;
        Ok(self.state.read().ethx_supply)
    }

    async fn total_staked_assets(&self, at: BlockTag) -> ChainResult<U256> {
        self.read("total_staked_assets", at).await?;
        Ok(self.state.read().total_staked_assets)
    }

    async fn sd_per_eth(&self, at: BlockTag) -> ChainResult<U256> {
        self.read("sd_per_eth", at).await?;
        Ok(self.state.read().sd_per_eth)
    }
}

// ============================================================================
// Beacon source
// ============================================================================

#[derive(Debug, Default)]
struct BeaconState {
    head_slot: u64,
    finalized_slot: u64,
    blocks: HashMap<u64, ExecutionBlockRef>,
    statuses: HashMap<ValidatorPubkey, BeaconValidatorStatus>,
}

/// In-memory [`BeaconSource`].
///
/// Statuses are slot independent: the same status is reported for a key at
/// every slot that has a block.
#[derive(Default)]
pub struct StubBeaconSource {
    state: RwLock<BeaconState>,
    control: CallControl,
}

impl StubBeaconSource {
    /// Create a beacon source with no blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block at `slot` carrying execution block `number`.
    ///
    /// The block hash is [`stub_block_hash`]`(number)`. Head and finalized
    /// slots advance to `slot` if it is newer.
    pub fn add_block(&self, slot: u64, number: u64) -> ExecutionBlockRef {
        let block = ExecutionBlockRef {
            slot,
            block_number: number,
            block_hash: stub_block_hash(number),
        };
        let mut state = self.state.write();
        state.blocks.insert(slot, block);
        state.head_slot = state.head_slot.max(slot);
        state.finalized_slot = state.finalized_slot.max(slot);
        block
    }

    /// Set head and finalized slots explicitly.
    pub fn set_slots(&self, head: u64, finalized: u64) {
        let mut state = self.state.write();
        state.head_slot = head;
        state.finalized_slot = finalized;
    }

    /// Report `status` for its public key.
    pub fn set_status(&self, status: BeaconValidatorStatus) {
        self.state.write().statuses.insert(status.pubkey, status);
    }

    /// Forget the status of a key.
    pub fn remove_status(&self, pubkey: &ValidatorPubkey) {
        self.state.write().statuses.remove(pubkey);
    }

    /// Make every call to `method` fail with `err`.
    pub fn fail_method(&self, method: &'static str, err: ChainError) {
        self.control.failures.write().insert(method, err);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.control.failures.write().clear();
    }

    /// Delay every call by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.control.delay.write() = delay;
    }

    /// Number of calls served so far.
    pub fn call_count(&self) -> u64 {
        self.control.calls.load(Ordering::Relaxed)
    }

    /// Most concurrent calls to `method` observed.
    pub fn max_in_flight(&self, method: &str) -> u64 {
        self.control.max_in_flight(method)
    }

    /// Calls made to `method`.
    pub fn calls_to(&self, method: &str) -> u64 {
        self.control.calls_to(method)
    }
}

#[async_trait]
impl BeaconSource for StubBeaconSource {
    async fn slot(&self, tag: SlotTag) -> ChainResult<u64> {
        trace!("StubBeaconSource::slot({})", tag.as_str());
        self.control.enter("slot").await?;
        let state = self.state.read();
        Ok(match tag {
            SlotTag::Head => state.head_slot,
            SlotTag::Finalized => state.finalized_slot,
        })
    }

    async fn execution_block_at_slot(&self, slot: u64) -> ChainResult<Option<ExecutionBlockRef>> {
        trace!("StubBeaconSource::execution_block_at_slot({})", slot);
        self.control.enter("execution_block_at_slot").await?;
        Ok(self.state.read().blocks.get(&slot).copied())
    }

    async fn validator_statuses(
        &self,
        pubkeys: &[ValidatorPubkey],
        slot: u64,
    ) -> ChainResult<HashMap<ValidatorPubkey, BeaconValidatorStatus>> {
        trace!(
            "StubBeaconSource::validator_statuses({} keys, {})",
            pubkeys.len(),
            slot
        );
        self.control.enter("validator_statuses").await?;
        let state = self.state.read();
        Ok(pubkeys
            .iter()
            .filter_map(|key| state.statuses.get(key).map(|s| (*key, s.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stader_types::ValidatorContractStatus;

    fn operator(id: OperatorId) -> OperatorRecord {
        OperatorRecord {
            id,
            operator_address: Address::repeat_byte(id as u8),
            reward_address: Address::repeat_byte(0xee),
            name: format!("op-{id}"),
            active: true,
            opted_for_socializing_pool: false,
        }
    }

    fn validator(id: ValidatorId, operator_id: OperatorId) -> ValidatorRecord {
        ValidatorRecord {
            id,
            pubkey: ValidatorPubkey::from_bytes([id as u8; 48]),
            operator_id,
            status: ValidatorContractStatus::Deposited,
            withdraw_vault: Address::repeat_byte(0x10 + id as u8),
            deposit_block: 1,
            withdrawn_block: 0,
        }
    }

    #[tokio::test]
    async fn test_registry_operator_keys() {
        let registry = StubChainRegistry::new();
        registry.add_operator(operator(3), vec![validator(7, 3), validator(9, 3)]);

        let at = BlockTag::Number(10);
        let id = registry
            .operator_id_by_address(Address::repeat_byte(3), at)
            .await
            .unwrap();
        assert_eq!(id, 3);
        assert_eq!(registry.operator_total_keys(3, at).await.unwrap(), 2);
        assert_eq!(registry.validator_id_by_operator(3, 1, at).await.unwrap(), 9);
        assert!(registry.validator_id_by_operator(3, 2, at).await.is_err());
        assert_eq!(registry.next_validator_id(at).await.unwrap(), 10);
        assert_eq!(registry.next_operator_id(at).await.unwrap(), 4);
        assert_eq!(registry.observed_tags(), vec![at]);
    }

    #[tokio::test]
    async fn test_registry_unknown_operator() {
        let registry = StubChainRegistry::new();
        let at = BlockTag::Latest;
        assert_eq!(
            registry
                .operator_id_by_address(Address::repeat_byte(1), at)
                .await
                .unwrap(),
            0
        );
        assert!(!registry.operator_by_id(5, at).await.unwrap().is_registered());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let registry = StubChainRegistry::new();
        registry.fail_method("balance", ChainError::Transport("refused".into()));
        let err = registry
            .balance(Address::ZERO, BlockTag::Latest)
            .await
            .unwrap_err();
        assert!(err.is_retriable());
        registry.clear_failures();
        assert!(registry.balance(Address::ZERO, BlockTag::Latest).await.is_ok());
        assert_eq!(registry.call_count(), 2);
    }

    #[tokio::test]
    async fn test_beacon_blocks_and_statuses() {
        let beacon = StubBeaconSource::new();
        let block = beacon.add_block(100, 5_000);
        assert_eq!(block.block_hash, stub_block_hash(5_000));
        assert_eq!(beacon.slot(SlotTag::Finalized).await.unwrap(), 100);
        assert!(beacon.execution_block_at_slot(99).await.unwrap().is_none());

        let known = ValidatorPubkey::from_bytes([1; 48]);
        let unknown = ValidatorPubkey::from_bytes([2; 48]);
        beacon.set_status(validator_status(
            known,
            11,
            BeaconValidatorState::ActiveOngoing,
            false,
        ));
        let statuses = beacon
            .validator_statuses(&[known, unknown], 100)
            .await
            .unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[&known].index, 11);
    }
}
