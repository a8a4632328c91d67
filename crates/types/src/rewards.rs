//! Reward-distribution types shared by the registry client and the calculator.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Staking pool identifier. The permissionless pool is 1.
pub type PoolId = u8;

/// Permissionless pool id.
pub const PERMISSIONLESS_POOL_ID: PoolId = 1;

/// A balance split between the three reward recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardShare {
    /// Portion attributed to ETHx holders.
    pub user_share: U256,
    /// Portion attributed to the node operator.
    pub operator_share: U256,
    /// Portion attributed to the protocol treasury.
    pub protocol_share: U256,
}

impl RewardShare {
    /// Sum of all three shares.
    pub fn total(&self) -> U256 {
        self.user_share + self.operator_share + self.protocol_share
    }
}

/// Per-pool parameters the reward split depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Pool these parameters belong to.
    pub pool_id: PoolId,
    /// ETH each validator deposit carries in total (32 ETH, in wei).
    pub staked_eth_per_node: U256,
    /// ETH the operator puts up per validator (wei).
    pub collateral_eth: U256,
    /// Protocol fee in basis points of the user portion.
    pub protocol_fee_bps: U256,
    /// Operator fee in basis points of the user portion.
    pub operator_fee_bps: U256,
}

/// Socializing-pool reward cycle pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardCycleDetails {
    /// Index of the current cycle.
    pub current_index: u64,
    /// First block of the current cycle.
    pub current_start_block: u64,
    /// Last block of the current cycle.
    pub current_end_block: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_share_total() {
        let share = RewardShare {
            user_share: U256::from(7),
            operator_share: U256::from(2),
            protocol_share: U256::from(1),
        };
        assert_eq!(share.total(), U256::from(10));
    }
}
