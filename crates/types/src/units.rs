//! Unit conversions for display and metrics.

use alloy_primitives::U256;

/// Wei per ether.
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Wei per gwei.
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Whole ether as wei.
pub fn eth(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WEI_PER_ETH)
}

/// Gwei as wei.
pub fn gwei_to_wei(gwei: u64) -> U256 {
    U256::from(gwei) * U256::from(WEI_PER_GWEI)
}

/// Lossy conversion of a wei amount to ether as `f64`.
///
/// Used for gauges and human-readable output only. Amounts above `u128::MAX`
/// saturate.
pub fn wei_to_eth(wei: U256) -> f64 {
    let whole = wei / U256::from(WEI_PER_ETH);
    let frac = wei % U256::from(WEI_PER_ETH);
    let whole = u128::try_from(whole).unwrap_or(u128::MAX) as f64;
    let frac = u128::try_from(frac).unwrap_or(0) as f64 / WEI_PER_ETH as f64;
    whole + frac
}

/// Lossy conversion of a count-like `U256` to `f64`.
pub fn u256_to_f64(value: U256) -> f64 {
    u128::try_from(value).map(|v| v as f64).unwrap_or(f64::MAX)
}
