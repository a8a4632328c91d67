//! Human-readable rendering of snapshots for `staderd status` and
//! `staderd network`.

use alloy_primitives::U256;
use stader_state::{LifecycleBucket, NetworkSnapshot, OperatorSnapshot};
use stader_types::units::wei_to_eth;
use std::fmt;

fn amount(wei: U256) -> String {
    format!("{:.6}", wei_to_eth(wei))
}

fn optional_amount(wei: Option<U256>) -> String {
    wei.map(amount).unwrap_or_else(|| "n/a".to_string())
}

fn header(out: &mut fmt::Formatter<'_>, snapshot: &NetworkSnapshot) -> fmt::Result {
    writeln!(
        out,
        "Snapshot: slot {} / block {} ({})",
        snapshot.beacon_slot, snapshot.execution_block, snapshot.execution_block_hash
    )?;
    if snapshot.is_degraded() {
        writeln!(
            out,
            "WARNING: registry reads were not pinned to the block; figures are best-effort."
        )?;
    }
    writeln!(out)
}

/// Operator status report, printed by `staderd status`.
pub struct StatusReport<'a>(pub &'a NetworkSnapshot);

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_status(out, self.0)
    }
}

/// Network-wide report, printed by `staderd network`.
pub struct NetworkReport<'a>(pub &'a NetworkSnapshot);

impl fmt::Display for NetworkReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_network(out, self.0)
    }
}

/// Operator status report as text.
pub fn render_status(snapshot: &NetworkSnapshot) -> String {
    StatusReport(snapshot).to_string()
}

/// Network-wide report as text.
pub fn render_network(snapshot: &NetworkSnapshot) -> String {
    NetworkReport(snapshot).to_string()
}

fn write_status(out: &mut fmt::Formatter<'_>, snapshot: &NetworkSnapshot) -> fmt::Result {
    header(out, snapshot)?;
    match &snapshot.operator {
        Some(operator) => write_operator(out, snapshot, operator),
        None => writeln!(
            out,
            "Node {} is not registered as a permissionless operator.",
            snapshot.node_address
        ),
    }
}

fn write_operator(
    out: &mut fmt::Formatter<'_>,
    snapshot: &NetworkSnapshot,
    op: &OperatorSnapshot,
) -> fmt::Result {
    let record = &op.operator;
    writeln!(out, "Operator")?;
    writeln!(out, "  ID:                      {}", record.id)?;
    writeln!(out, "  Name:                    {}", record.name)?;
    writeln!(out, "  Address:                 {}", record.operator_address)?;
    writeln!(out, "  Reward address:          {}", record.reward_address)?;
    writeln!(out, "  Active:                  {}", record.active)?;
    writeln!(
        out,
        "  Socializing pool:        {}",
        record.opted_for_socializing_pool
    )?;
    writeln!(out)?;

    writeln!(out, "Collateral")?;
    writeln!(out, "  SD deposited:            {}", amount(op.sd_collateral))?;
    writeln!(
        out,
        "  Max validators:          {}",
        op.max_validators_spawnable
    )?;
    writeln!(out, "  Headroom:                {}", op.spawnable_headroom)?;
    writeln!(out)?;

    writeln!(out, "Rewards (ETH)")?;
    writeln!(out, "  EL reward vault:         {}", op.el_reward_vault)?;
    writeln!(
        out,
        "  EL vault operator share: {}",
        amount(op.el_rewards.operator_share)
    )?;
    writeln!(
        out,
        "  Unclaimed EL rewards:    {}",
        amount(op.unclaimed_el_rewards)
    )?;
    writeln!(
        out,
        "  Cumulative penalty:      {}",
        amount(op.cumulative_penalty)
    )?;
    writeln!(
        out,
        "  Socializing unclaimed:   {}",
        optional_amount(op.socializing_pool.unclaimed_eth)
    )?;
    writeln!(
        out,
        "  Rewards threshold:       {}",
        amount(snapshot.rewards_threshold)
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "Validators ({} keys, {} not terminal)",
        op.total_keys, op.non_terminal_keys
    )?;
    for bucket in LifecycleBucket::ALL {
        let label = format!("{}:", bucket.as_str());
        writeln!(out, "  {:<24} {}", label, op.counts.get(bucket))?;
    }

    for (pubkey, entry) in &op.validators {
        writeln!(out)?;
        writeln!(out, "  {}", pubkey)?;
        writeln!(out, "    Registry status:       {}", entry.record.status)?;
        match &entry.beacon {
            Some(beacon) => {
                writeln!(
                    out,
                    "    Beacon:                {} (index {}, slashed {})",
                    beacon.state, beacon.index, beacon.slashed
                )?;
            }
            None => {
                writeln!(out, "    Beacon:                unknown")?;
            }
        }
        let buckets: Vec<_> = entry.buckets.iter().map(|b| b.as_str()).collect();
        writeln!(out, "    Buckets:               {}", buckets.join(", "))?;
        writeln!(out, "    Withdraw vault:        {}", entry.record.withdraw_vault)?;
        writeln!(out, "    Vault balance:         {}", amount(entry.vault_balance))?;
        if entry.crossed_rewards_threshold {
            writeln!(
                out,
                "    Settlement share:      {}",
                optional_amount(entry.withdraw_share.map(|s| s.operator_share))
            )?;
        } else {
            writeln!(
                out,
                "    Operator rewards:      {}",
                amount(entry.reward_share.operator_share)
            )?;
        }
        writeln!(out, "    Penalty:               {}", amount(entry.penalty))?;
    }
    Ok(())
}

fn write_network(out: &mut fmt::Formatter<'_>, snapshot: &NetworkSnapshot) -> fmt::Result {
    header(out, snapshot)?;

    let network = &snapshot.network;
    let params = &snapshot.reward_params;
    writeln!(out, "Network")?;
    writeln!(out, "  Operators registered:    {}", network.total_operators)?;
    writeln!(out, "  Validators created:      {}", network.total_validators)?;
    writeln!(out, "  Validators active:       {}", network.active_validators)?;
    writeln!(out, "  Validators queued:       {}", network.queued_validators)?;
    writeln!(out, "  SD price (SD per ETH):   {}", amount(network.sd_per_eth))?;
    writeln!(
        out,
        "  SD collateral staked:    {}",
        amount(network.total_sd_collateral)
    )?;
    writeln!(
        out,
        "  ETH staked by users:     {}",
        amount(network.total_staked_by_users)
    )?;
    writeln!(
        out,
        "  ETH staked by operators: {}",
        amount(network.total_staked_by_operators)
    )?;
    writeln!(out, "  ETHx supply:             {}", amount(network.ethx_supply))?;
    writeln!(out)?;

    writeln!(out, "Pool {} parameters", params.pool_id)?;
    writeln!(
        out,
        "  Staked ETH per node:     {}",
        amount(params.staked_eth_per_node)
    )?;
    writeln!(out, "  Collateral ETH:          {}", amount(params.collateral_eth))?;
    writeln!(out, "  Protocol fee (bps):      {}", params.protocol_fee_bps)?;
    writeln!(out, "  Operator fee (bps):      {}", params.operator_fee_bps)?;
    writeln!(out)?;

    let cycle = &network.reward_cycle;
    writeln!(out, "Socializing pool")?;
    writeln!(out, "  Reward cycle:            {}", cycle.current_index)?;
    writeln!(
        out,
        "  Cycle blocks:            {} - {}",
        cycle.current_start_block, cycle.current_end_block
    )?;
    writeln!(out, "  Next reward block:       {}", network.next_reward_block())?;
    writeln!(
        out,
        "  Operator ETH remaining:  {}",
        amount(network.socializing_pool_eth_remaining)
    )?;
    writeln!(
        out,
        "  Operator SD remaining:   {}",
        amount(network.socializing_pool_sd_remaining)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use stader_state::{Consistency, NetworkDetails};
    use stader_types::units::eth;
    use stader_types::{RewardCycleDetails, RewardParams, PERMISSIONLESS_POOL_ID};

    fn snapshot() -> NetworkSnapshot {
        NetworkSnapshot {
            beacon_slot: 100,
            execution_block: 5_000,
            execution_block_hash: B256::ZERO,
            consistency: Consistency::Pinned,
            built_at: 0,
            node_address: Address::repeat_byte(0xaa),
            reward_params: RewardParams {
                pool_id: PERMISSIONLESS_POOL_ID,
                staked_eth_per_node: eth(32),
                collateral_eth: eth(4),
                protocol_fee_bps: U256::from(500),
                operator_fee_bps: U256::from(500),
            },
            rewards_threshold: eth(8),
            network: NetworkDetails {
                total_operators: 12,
                reward_cycle: RewardCycleDetails {
                    current_index: 3,
                    current_start_block: 1_000,
                    current_end_block: 1_999,
                },
                ethx_supply: eth(250),
                ..Default::default()
            },
            operator: None,
        }
    }

    #[test]
    fn test_status_for_unregistered_node() {
        let text = render_status(&snapshot());
        assert!(text.contains("slot 100 / block 5000"));
        assert!(text.contains("not registered"));
        assert!(!text.contains("WARNING"));
    }

    #[test]
    fn test_degraded_snapshot_is_flagged() {
        let mut degraded = snapshot();
        degraded.consistency = Consistency::BestEffort;
        assert!(render_network(&degraded).contains("WARNING"));
    }

    #[test]
    fn test_network_report() {
        let text = render_network(&snapshot());
        assert!(text.contains("Operators registered:    12"));
        assert!(text.contains("ETHx supply:             250.000000"));
        assert!(text.contains("Collateral ETH:          4.000000"));
        assert!(text.contains("Next reward block:       2000"));
    }

    #[test]
    fn test_reports_display_inline() {
        let snap = snapshot();
        let text = format!("{}", NetworkReport(&snap));
        assert!(text.starts_with("Snapshot: slot 100 / block 5000"));
        assert!(text.contains("Pool 1 parameters"));
        assert_eq!(StatusReport(&snap).to_string(), render_status(&snap));
    }
}
