//! Network-wide gauges.

use once_cell::sync::Lazy;
use prometheus::{Gauge, Registry};
use stader_state::NetworkSnapshot;
use stader_types::units::wei_to_eth;

pub static NETWORK_SD_PRICE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_network_sd_price", "SD received for one ETH")
        .expect("metric can be created")
});

pub static NETWORK_TOTAL_VALIDATORS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_total_validators_created",
        "Validators ever registered",
    )
    .expect("metric can be created")
});

pub static NETWORK_ACTIVE_VALIDATORS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_total_validators_active",
        "Validators the registry counts as active",
    )
    .expect("metric can be created")
});

pub static NETWORK_QUEUED_VALIDATORS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_total_validators_queued",
        "Validators waiting in the deposit queue",
    )
    .expect("metric can be created")
});

pub static NETWORK_TOTAL_OPERATORS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_total_operator_registered",
        "Operators ever registered",
    )
    .expect("metric can be created")
});

pub static NETWORK_STAKED_SD: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_total_staked_sd_collateral",
        "SD staked as collateral",
    )
    .expect("metric can be created")
});

pub static NETWORK_STAKED_USER_ETH: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_network_total_staked_user_eth", "ETH staked by users")
        .expect("metric can be created")
});

pub static NETWORK_STAKED_NOS_ETH: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_total_staked_nos_eth",
        "ETH staked by node operators",
    )
    .expect("metric can be created")
});

pub static NETWORK_ETHX_SUPPLY: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_network_total_ethx_supply", "ETHx total supply")
        .expect("metric can be created")
});

pub static NETWORK_NEXT_REWARD_BLOCK: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_next_reward_block",
        "First block of the next socializing pool reward cycle",
    )
    .expect("metric can be created")
});

pub static NETWORK_REWARD_CYCLE_INDEX: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_reward_cycle_index",
        "Current socializing pool reward cycle",
    )
    .expect("metric can be created")
});

pub static NETWORK_COLLATERAL_RATIO: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_collateral_ratio",
        "ETH collateral required to add a validator",
    )
    .expect("metric can be created")
});

pub static NETWORK_SP_ETH_REMAINING: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_socializing_pool_eth_remaining",
        "Operator ETH rewards unclaimed in the socializing pool",
    )
    .expect("metric can be created")
});

pub static NETWORK_SP_SD_REMAINING: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_network_socializing_pool_sd_remaining",
        "Operator SD rewards unclaimed in the socializing pool",
    )
    .expect("metric can be created")
});

/// Set every network gauge from `snapshot`.
pub fn observe(snapshot: &NetworkSnapshot) {
    let network = &snapshot.network;
    NETWORK_SD_PRICE.set(wei_to_eth(network.sd_per_eth));
    NETWORK_TOTAL_VALIDATORS.set(network.total_validators as f64);
    NETWORK_ACTIVE_VALIDATORS.set(network.active_validators as f64);
    NETWORK_QUEUED_VALIDATORS.set(network.queued_validators as f64);
    NETWORK_TOTAL_OPERATORS.set(network.total_operators as f64);
    NETWORK_STAKED_SD.set(wei_to_eth(network.total_sd_collateral));
    NETWORK_STAKED_USER_ETH.set(wei_to_eth(network.total_staked_by_users));
    NETWORK_STAKED_NOS_ETH.set(wei_to_eth(network.total_staked_by_operators));
    NETWORK_ETHX_SUPPLY.set(wei_to_eth(network.ethx_supply));
    NETWORK_NEXT_REWARD_BLOCK.set(network.next_reward_block() as f64);
    NETWORK_REWARD_CYCLE_INDEX.set(network.reward_cycle.current_index as f64);
    NETWORK_COLLATERAL_RATIO.set(wei_to_eth(snapshot.reward_params.collateral_eth));
    NETWORK_SP_ETH_REMAINING.set(wei_to_eth(network.socializing_pool_eth_remaining));
    NETWORK_SP_SD_REMAINING.set(wei_to_eth(network.socializing_pool_sd_remaining));
}

/// Register all network metrics with the given registry.
pub fn register_metrics(registry: &Registry) {
    registry.register(Box::new(NETWORK_SD_PRICE.clone())).ok();
    registry
        .register(Box::new(NETWORK_TOTAL_VALIDATORS.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_ACTIVE_VALIDATORS.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_QUEUED_VALIDATORS.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_TOTAL_OPERATORS.clone()))
        .ok();
    registry.register(Box::new(NETWORK_STAKED_SD.clone())).ok();
    registry
        .register(Box::new(NETWORK_STAKED_USER_ETH.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_STAKED_NOS_ETH.clone()))
        .ok();
    registry.register(Box::new(NETWORK_ETHX_SUPPLY.clone())).ok();
    registry
        .register(Box::new(NETWORK_NEXT_REWARD_BLOCK.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_REWARD_CYCLE_INDEX.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_COLLATERAL_RATIO.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_SP_ETH_REMAINING.clone()))
        .ok();
    registry
        .register(Box::new(NETWORK_SP_SD_REMAINING.clone()))
        .ok();
}
