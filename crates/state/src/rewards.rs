//! Reward split and threshold policy.
//!
//! Pure arithmetic over `U256`, mirroring the pool utils contract so a
//! snapshot can split any number of vault balances with one parameter read.

use alloy_primitives::U256;
use stader_types::{RewardParams, RewardShare};

/// Basis-point denominator for protocol and operator fees.
pub const MAX_FEE_BPS: u64 = 10_000;

/// Split `total` between users, operator and protocol.
///
/// The operator earns the collateral-proportional part outright plus its fee
/// on the user-funded part; the protocol takes its fee from the user-funded
/// part; users keep the remainder, so the three shares always sum to `total`.
pub fn reward_share(total: U256, params: &RewardParams) -> RewardShare {
    let staked = params.staked_eth_per_node;
    if staked.is_zero() {
        return RewardShare {
            user_share: total,
            ..RewardShare::default()
        };
    }

    let collateral = params.collateral_eth.min(staked);
    let max_fee = U256::from(MAX_FEE_BPS);
    let user_before_commission = total * (staked - collateral) / staked;

    let protocol_share = params.protocol_fee_bps * user_before_commission / max_fee;
    let operator_share =
        total * collateral / staked + params.operator_fee_bps * user_before_commission / max_fee;
    let user_share = total
        .saturating_sub(protocol_share)
        .saturating_sub(operator_share);

    RewardShare {
        user_share,
        operator_share,
        protocol_share,
    }
}

/// Whether a withdraw vault balance counts as unclaimed rewards.
///
/// Above the threshold the vault is assumed to hold exit principal and the
/// whole balance is left out.
pub fn counts_as_rewards(vault_balance: U256, rewards_threshold: U256) -> bool {
    vault_balance <= rewards_threshold
}
