//! [`ChainRegistry`] over an execution-layer JSON-RPC endpoint.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Deserialize;
use stader_types::{
    OperatorId, OperatorRecord, PoolId, RewardCycleDetails, RewardParams, RewardShare,
    ValidatorContractStatus, ValidatorId, ValidatorPubkey, ValidatorRecord,
};
use tracing::trace;

use crate::config::{ClientConfig, ContractAddresses};
use crate::contracts::{
    IERC20, IPenalty, IPermissionlessNodeRegistry, IPoolUtils, ISDCollateral, ISocializingPool,
    IStaderConfig, IStakePoolManager, IValidatorWithdrawalVault,
};
use crate::error::{ChainError, ChainResult};
use crate::traits::{BlockTag, ChainRegistry, SocializingPoolRemaining};

/// Subset of an `eth_getBlockByNumber` response.
#[derive(Debug, Deserialize)]
struct BlockHeader {
    hash: B256,
}

/// Reads contract state through `eth_call` on a JSON-RPC endpoint.
pub struct RpcChainRegistry {
    client: HttpClient,
    contracts: ContractAddresses,
    archive: bool,
}

impl RpcChainRegistry {
    /// Connect to `url`. No request is sent until the first read.
    pub fn new(url: &str, contracts: ContractAddresses, config: &ClientConfig) -> ChainResult<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .build(url)
            .map_err(|e| ChainError::Transport(format!("{url}: {e}")))?;
        Ok(Self {
            client,
            contracts,
            archive: config.archive,
        })
    }

    fn tag(&self, at: BlockTag) -> BlockTag {
        if self.archive {
            at
        } else {
            BlockTag::Latest
        }
    }

    async fn call<C: SolCall + Send>(
        &self,
        to: Address,
        call: C,
        at: BlockTag,
    ) -> ChainResult<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let request = serde_json::json!({ "to": to, "data": data });
        let at = self.tag(at);
        trace!(method = C::SIGNATURE, %to, %at, "eth_call");
        let output: Bytes = self
            .client
            .request("eth_call", rpc_params![request, at.to_rpc_param()])
            .await?;
        if output.is_empty() {
            return Err(ChainError::Reverted(format!(
                "{} returned no data (no contract at {to}?)",
                C::SIGNATURE
            )));
        }
        Ok(C::abi_decode_returns(&output)?)
    }

    fn registry(&self) -> Address {
        self.contracts.permissionless_node_registry
    }
}

fn to_u64(value: U256, what: &str) -> ChainResult<u64> {
    u64::try_from(value).map_err(|_| ChainError::InvalidResponse(format!("{what} overflows u64")))
}

#[async_trait]
impl ChainRegistry for RpcChainRegistry {
    fn supports_historical_reads(&self) -> bool {
        self.archive
    }

    async fn block_hash(&self, number: u64) -> ChainResult<Option<B256>> {
        let header: Option<BlockHeader> = self
            .client
            .request(
                "eth_getBlockByNumber",
                rpc_params![BlockTag::Number(number).to_rpc_param(), false],
            )
            .await?;
        Ok(header.map(|h| h.hash))
    }

    async fn operator_id_by_address(
        &self,
        address: Address,
        at: BlockTag,
    ) -> ChainResult<OperatorId> {
        let call = IPermissionlessNodeRegistry::operatorIDByAddressCall {
            operatorAddress: address,
        };
        let id = self.call(self.registry(), call, at).await?;
        to_u64(id, "operator id")
    }

    async fn operator_by_id(&self, id: OperatorId, at: BlockTag) -> ChainResult<OperatorRecord> {
        let call = IPermissionlessNodeRegistry::operatorStructByIdCall {
            operatorId: U256::from(id),
        };
        let ret = self.call(self.registry(), call, at).await?;
        Ok(OperatorRecord {
            id,
            operator_address: ret.operatorAddress,
            reward_address: ret.operatorRewardAddress,
            name: ret.operatorName,
            active: ret.active,
            opted_for_socializing_pool: ret.optedForSocializingPool,
        })
    }

    async fn operator_total_keys(&self, id: OperatorId, at: BlockTag) -> ChainResult<u64> {
        let call = IPermissionlessNodeRegistry::getOperatorTotalKeysCall {
            operatorId: U256::from(id),
        };
        to_u64(self.call(self.registry(), call, at).await?, "key count")
    }

    async fn validator_id_by_operator(
        &self,
        operator_id: OperatorId,
        index: u64,
        at: BlockTag,
    ) -> ChainResult<ValidatorId> {
        let call = IPermissionlessNodeRegistry::validatorIdsByOperatorIdCall {
            operatorId: U256::from(operator_id),
            index: U256::from(index),
        };
        to_u64(self.call(self.registry(), call, at).await?, "validator id")
    }

    async fn validator_by_id(
        &self,
        id: ValidatorId,
        at: BlockTag,
    ) -> ChainResult<Option<ValidatorRecord>> {
        let call = IPermissionlessNodeRegistry::validatorRegistryCall {
            validatorId: U256::from(id),
        };
        let ret = self.call(self.registry(), call, at).await?;
        // Unassigned ids come back as a zeroed struct.
        if ret.pubkey.is_empty() {
            return Ok(None);
        }
        let pubkey = ValidatorPubkey::try_from_slice(&ret.pubkey)
            .map_err(|e| ChainError::InvalidResponse(format!("validator {id}: {e}")))?;
        let status = ValidatorContractStatus::try_from(ret.status).map_err(|raw| {
            ChainError::InvalidResponse(format!("validator {id}: unknown status {raw}"))
        })?;
        Ok(Some(ValidatorRecord {
            id,
            pubkey,
            operator_id: to_u64(ret.operatorId, "operator id")?,
            status,
            withdraw_vault: ret.withdrawVaultAddress,
            deposit_block: to_u64(ret.depositBlock, "deposit block")?,
            withdrawn_block: to_u64(ret.withdrawnBlock, "withdrawn block")?,
        }))
    }

    async fn operator_el_reward_vault(
        &self,
        operator_id: OperatorId,
        at: BlockTag,
    ) -> ChainResult<Address> {
        let call = IPermissionlessNodeRegistry::nodeELRewardVaultByOperatorIdCall {
            operatorId: U256::from(operator_id),
        };
        self.call(self.registry(), call, at).await
    }

    async fn balance(&self, address: Address, at: BlockTag) -> ChainResult<U256> {
        let at = self.tag(at);
        trace!(%address, %at, "eth_getBalance");
        Ok(self
            .client
            .request("eth_getBalance", rpc_params![address, at.to_rpc_param()])
            .await?)
    }

    async fn reward_params(&self, pool_id: PoolId, at: BlockTag) -> ChainResult<RewardParams> {
        let pool_utils = self.contracts.pool_utils;
        let (staked_eth_per_node, collateral_eth, protocol_fee_bps, operator_fee_bps) = tokio::try_join!(
            self.call(
                self.contracts.stader_config,
                IStaderConfig::getStakedEthPerNodeCall {},
                at
            ),
            self.call(pool_utils, IPoolUtils::getCollateralETHCall { poolId: pool_id }, at),
            self.call(pool_utils, IPoolUtils::getProtocolFeeCall { poolId: pool_id }, at),
            self.call(pool_utils, IPoolUtils::getOperatorFeeCall { poolId: pool_id }, at),
        )?;
        Ok(RewardParams {
            pool_id,
            staked_eth_per_node,
            collateral_eth,
            protocol_fee_bps,
            operator_fee_bps,
        })
    }

    async fn rewards_threshold(&self, at: BlockTag) -> ChainResult<U256> {
        self.call(
            self.contracts.stader_config,
            IStaderConfig::getRewardsThresholdCall {},
            at,
        )
        .await
    }

    async fn reward_cycle(&self, at: BlockTag) -> ChainResult<RewardCycleDetails> {
        let ret = self
            .call(
                self.contracts.socializing_pool,
                ISocializingPool::getRewardDetailsCall {},
                at,
            )
            .await?;
        Ok(RewardCycleDetails {
            current_index: to_u64(ret.currentIndex, "cycle index")?,
            current_start_block: to_u64(ret.currentStartBlock, "cycle start")?,
            current_end_block: to_u64(ret.currentEndBlock, "cycle end")?,
        })
    }

    async fn socializing_pool_remaining(
        &self,
        at: BlockTag,
    ) -> ChainResult<SocializingPoolRemaining> {
        let pool = self.contracts.socializing_pool;
        let (eth, sd) = tokio::try_join!(
            self.call(pool, ISocializingPool::totalOperatorETHRewardsRemainingCall {}, at),
            self.call(pool, ISocializingPool::totalOperatorSDRewardsRemainingCall {}, at),
        )?;
        Ok(SocializingPoolRemaining { eth, sd })
    }

    async fn cumulative_penalty(&self, pubkey: ValidatorPubkey, at: BlockTag) -> ChainResult<U256> {
        let call = IPenalty::totalPenaltyAmountCall {
            pubkey: Bytes::copy_from_slice(pubkey.as_bytes()),
        };
        self.call(self.contracts.penalty_tracker, call, at).await
    }

    async fn vault_withdraw_share(&self, vault: Address, at: BlockTag) -> ChainResult<RewardShare> {
        let ret = self
            .call(
                vault,
                IValidatorWithdrawalVault::calculateValidatorWithdrawalShareCall {},
                at,
            )
            .await?;
        Ok(RewardShare {
            user_share: ret.userShare,
            operator_share: ret.operatorShare,
            protocol_share: ret.protocolShare,
        })
    }

    async fn operator_sd_collateral(&self, operator: Address, at: BlockTag) -> ChainResult<U256> {
        let call = ISDCollateral::operatorSDBalanceCall { operator };
        self.call(self.contracts.sd_collateral, call, at).await
    }

    async fn max_validators_for_collateral(
        &self,
        sd_amount: U256,
        pool_id: PoolId,
        at: BlockTag,
    ) -> ChainResult<u64> {
        let call = ISDCollateral::getMaxValidatorSpawnableCall {
            sdAmount: sd_amount,
            poolId: pool_id,
        };
        to_u64(
            self.call(self.contracts.sd_collateral, call, at).await?,
            "spawnable validators",
        )
    }

    async fn next_operator_id(&self, at: BlockTag) -> ChainResult<u64> {
        let call = IPermissionlessNodeRegistry::nextOperatorIdCall {};
        to_u64(self.call(self.registry(), call, at).await?, "next operator id")
    }

    async fn next_validator_id(&self, at: BlockTag) -> ChainResult<u64> {
        let call = IPermissionlessNodeRegistry::nextValidatorIdCall {};
        to_u64(self.call(self.registry(), call, at).await?, "next validator id")
    }

    async fn total_active_validators(&self, at: BlockTag) -> ChainResult<u64> {
        let call = IPermissionlessNodeRegistry::getTotalActiveValidatorCountCall {};
        to_u64(self.call(self.registry(), call, at).await?, "active count")
    }

    async fn total_queued_validators(&self, at: BlockTag) -> ChainResult<u64> {
        let call = IPermissionlessNodeRegistry::getTotalQueuedValidatorCountCall {};
        to_u64(self.call(self.registry(), call, at).await?, "queued count")
    }

    async fn total_sd_collateral(&self, at: BlockTag) -> ChainResult<U256> {
        let call = ISDCollateral::totalSDCollateralCall {};
        self.call(self.contracts.sd_collateral, call, at).await
    }

    async fn ethx_supply(&self, at: BlockTag) -> ChainResult<U256> {
        self.call(self.contracts.ethx, IERC20::totalSupplyCall {}, at)
            .await
    }

    async fn total_staked_assets(&self, at: BlockTag) -> ChainResult<U256> {
        let call = IStakePoolManager::totalAssetsCall {};
        self.call(self.contracts.stake_pool_manager, call, at).await
    }

    async fn sd_per_eth(&self, at: BlockTag) -> ChainResult<U256> {
        let call = ISDCollateral::convertETHToSDCall {
            ethAmount: U256::from(10).pow(U256::from(18)),
        };
        self.call(self.contracts.sd_collateral, call, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_only_endpoint_ignores_pinned_block() {
        let config = ClientConfig {
            archive: false,
            ..Default::default()
        };
        let registry =
            RpcChainRegistry::new("http://127.0.0.1:8545", ContractAddresses::default(), &config)
                .unwrap();
        assert!(!registry.supports_historical_reads());
        assert_eq!(registry.tag(BlockTag::Number(7)), BlockTag::Latest);
    }

    #[test]
    fn test_archive_endpoint_keeps_pinned_block() {
        let registry = RpcChainRegistry::new(
            "http://127.0.0.1:8545",
            ContractAddresses::default(),
            &ClientConfig::default(),
        )
        .unwrap();
        assert_eq!(registry.tag(BlockTag::Number(7)), BlockTag::Number(7));
    }

    #[test]
    fn test_invalid_url() {
        let result = RpcChainRegistry::new(
            "not a url",
            ContractAddresses::default(),
            &ClientConfig::default(),
        );
        assert!(matches!(result, Err(ChainError::Transport(_))));
    }
}
