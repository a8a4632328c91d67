//! Operator gauges.

use once_cell::sync::Lazy;
use prometheus::{Gauge, GaugeVec, Registry};
use stader_state::{LifecycleBucket, OperatorSnapshot};
use stader_types::units::wei_to_eth;

pub static NODE_REGISTERED: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_registered",
        "1 if the node address is a registered operator",
    )
    .expect("metric can be created")
});

pub static NODE_OPERATOR_ID: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_node_operator_id", "Registry operator id")
        .expect("metric can be created")
});

pub static NODE_TOTAL_KEYS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_node_total_keys", "Validator keys ever registered")
        .expect("metric can be created")
});

pub static NODE_NON_TERMINAL_KEYS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_non_terminal_keys",
        "Validator keys not yet withdrawn or rejected",
    )
    .expect("metric can be created")
});

// Lifecycle
pub static NODE_VALIDATORS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        prometheus::opts!(
            "stader_node_validators",
            "Validators per lifecycle bucket; buckets overlap"
        ),
        &["bucket"],
    )
    .expect("metric can be created")
});

// Rewards
pub static NODE_UNCLAIMED_EL_REWARDS: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_unclaimed_el_rewards",
        "Operator share of withdraw vaults below the rewards threshold, in ETH",
    )
    .expect("metric can be created")
});

pub static NODE_EL_REWARD_VAULT_SHARE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_el_reward_vault_operator_share",
        "Operator share of the EL reward vault, in ETH",
    )
    .expect("metric can be created")
});

pub static NODE_CUMULATIVE_PENALTY: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_cumulative_penalty",
        "Penalties across the operator's keys, in ETH",
    )
    .expect("metric can be created")
});

// Collateral
pub static NODE_SD_COLLATERAL: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new("stader_node_sd_collateral", "SD deposited as collateral")
        .expect("metric can be created")
});

pub static NODE_MAX_VALIDATORS_SPAWNABLE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_max_validators_spawnable",
        "Validators the deposited SD can back",
    )
    .expect("metric can be created")
});

pub static NODE_SPAWNABLE_HEADROOM: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "stader_node_spawnable_headroom",
        "Further keys the deposited SD can back",
    )
    .expect("metric can be created")
});

/// Set every operator gauge from `operator`; zero them for an
/// unregistered node.
pub fn observe(operator: Option<&OperatorSnapshot>) {
    let Some(operator) = operator else {
        reset();
        return;
    };

    NODE_REGISTERED.set(1.0);
    NODE_OPERATOR_ID.set(operator.operator.id as f64);
    NODE_TOTAL_KEYS.set(operator.total_keys as f64);
    NODE_NON_TERMINAL_KEYS.set(operator.non_terminal_keys as f64);
    for bucket in LifecycleBucket::ALL {
        NODE_VALIDATORS
            .with_label_values(&[bucket.as_str()])
            .set(operator.counts.get(bucket) as f64);
    }
    NODE_UNCLAIMED_EL_REWARDS.set(wei_to_eth(operator.unclaimed_el_rewards));
    NODE_EL_REWARD_VAULT_SHARE.set(wei_to_eth(operator.el_rewards.operator_share));
    NODE_CUMULATIVE_PENALTY.set(wei_to_eth(operator.cumulative_penalty));
    NODE_SD_COLLATERAL.set(wei_to_eth(operator.sd_collateral));
    NODE_MAX_VALIDATORS_SPAWNABLE.set(operator.max_validators_spawnable as f64);
    NODE_SPAWNABLE_HEADROOM.set(operator.spawnable_headroom as f64);
}

fn reset() {
    NODE_REGISTERED.set(0.0);
    NODE_OPERATOR_ID.set(0.0);
    NODE_TOTAL_KEYS.set(0.0);
    NODE_NON_TERMINAL_KEYS.set(0.0);
    for bucket in LifecycleBucket::ALL {
        NODE_VALIDATORS.with_label_values(&[bucket.as_str()]).set(0.0);
    }
    NODE_UNCLAIMED_EL_REWARDS.set(0.0);
    NODE_EL_REWARD_VAULT_SHARE.set(0.0);
    NODE_CUMULATIVE_PENALTY.set(0.0);
    NODE_SD_COLLATERAL.set(0.0);
    NODE_MAX_VALIDATORS_SPAWNABLE.set(0.0);
    NODE_SPAWNABLE_HEADROOM.set(0.0);
}

/// Register all operator metrics with the given registry.
pub fn register_metrics(registry: &Registry) {
    registry.register(Box::new(NODE_REGISTERED.clone())).ok();
    registry.register(Box::new(NODE_OPERATOR_ID.clone())).ok();
    registry.register(Box::new(NODE_TOTAL_KEYS.clone())).ok();
    registry
        .register(Box::new(NODE_NON_TERMINAL_KEYS.clone()))
        .ok();
    registry.register(Box::new(NODE_VALIDATORS.clone())).ok();
    registry
        .register(Box::new(NODE_UNCLAIMED_EL_REWARDS.clone()))
        .ok();
    registry
        .register(Box::new(NODE_EL_REWARD_VAULT_SHARE.clone()))
        .ok();
    registry
        .register(Box::new(NODE_CUMULATIVE_PENALTY.clone()))
        .ok();
    registry.register(Box::new(NODE_SD_COLLATERAL.clone())).ok();
    registry
        .register(Box::new(NODE_MAX_VALIDATORS_SPAWNABLE.clone()))
        .ok();
    registry
        .register(Box::new(NODE_SPAWNABLE_HEADROOM.clone()))
        .ok();
}
