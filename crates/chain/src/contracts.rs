//! View-function bindings for the registry and its satellite contracts.
//!
//! Only the read surface the aggregation engine needs is declared.

use alloy_sol_types::sol;

sol! {
    /// Permissionless node registry.
    interface IPermissionlessNodeRegistry {
        function operatorIDByAddress(address operatorAddress) external view returns (uint256);

        function operatorStructById(uint256 operatorId) external view returns (
            bool active,
            bool optedForSocializingPool,
            string operatorName,
            address operatorRewardAddress,
            address operatorAddress
        );

        function getOperatorTotalKeys(uint256 operatorId) external view returns (uint256);

        function validatorIdsByOperatorId(uint256 operatorId, uint256 index) external view returns (uint256);

        function validatorRegistry(uint256 validatorId) external view returns (
            uint8 status,
            bytes pubkey,
            bytes preDepositSignature,
            bytes depositSignature,
            address withdrawVaultAddress,
            uint256 operatorId,
            uint256 depositBlock,
            uint256 withdrawnBlock
        );

        function nodeELRewardVaultByOperatorId(uint256 operatorId) external view returns (address);

        function nextOperatorId() external view returns (uint256);

        function nextValidatorId() external view returns (uint256);

        function getTotalActiveValidatorCount() external view returns (uint256);

        function getTotalQueuedValidatorCount() external view returns (uint256);
    }

    /// Per-pool fee and collateral parameters.
    interface IPoolUtils {
        function getProtocolFee(uint8 poolId) external view returns (uint256);

        function getOperatorFee(uint8 poolId) external view returns (uint256);

        function getCollateralETH(uint8 poolId) external view returns (uint256);
    }

    /// Protocol-wide configuration.
    interface IStaderConfig {
        function getStakedEthPerNode() external view returns (uint256);

        function getRewardsThreshold() external view returns (uint256);
    }

    /// SD token collateral.
    interface ISDCollateral {
        function operatorSDBalance(address operator) external view returns (uint256);

        function getMaxValidatorSpawnable(uint256 sdAmount, uint8 poolId) external view returns (uint256);

        function convertETHToSD(uint256 ethAmount) external view returns (uint256);

        function totalSDCollateral() external view returns (uint256);
    }

    /// Validator penalties.
    interface IPenalty {
        function totalPenaltyAmount(bytes pubkey) external view returns (uint256);
    }

    /// Operator reward pool for opted-in operators.
    interface ISocializingPool {
        function getRewardDetails() external view returns (
            uint256 currentIndex,
            uint256 currentStartBlock,
            uint256 currentEndBlock
        );

        function totalOperatorETHRewardsRemaining() external view returns (uint256);

        function totalOperatorSDRewardsRemaining() external view returns (uint256);
    }

    /// User deposit pool.
    interface IStakePoolManager {
        function totalAssets() external view returns (uint256);
    }

    /// ETHx liquid staking token.
    interface IERC20 {
        function totalSupply() external view returns (uint256);
    }

    /// Per-validator withdraw vault.
    interface IValidatorWithdrawalVault {
        function calculateValidatorWithdrawalShare() external view returns (
            uint256 userShare,
            uint256 operatorShare,
            uint256 protocolShare
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn test_calldata_layout() {
        let call = IPermissionlessNodeRegistry::operatorIDByAddressCall {
            operatorAddress: Address::repeat_byte(0xab),
        };
        let data = call.abi_encode();
        // selector + one address word
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(
            &data[..4],
            &IPermissionlessNodeRegistry::operatorIDByAddressCall::SELECTOR
        );
        assert_eq!(&data[16..36], Address::repeat_byte(0xab).as_slice());
    }

    #[test]
    fn test_decode_single_return() {
        let word = U256::from(42).to_be_bytes::<32>();
        let id =
            IPermissionlessNodeRegistry::getOperatorTotalKeysCall::abi_decode_returns(&word)
                .unwrap();
        assert_eq!(id, U256::from(42));
    }
}
