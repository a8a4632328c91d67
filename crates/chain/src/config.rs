//! Contract address book and client settings.

use std::time::Duration;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Addresses of every contract the registry client reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContractAddresses {
    /// Permissionless node registry.
    pub permissionless_node_registry: Address,
    /// Pool utils (fees and collateral per pool).
    pub pool_utils: Address,
    /// Stader config (rewards threshold, staked ETH per node).
    pub stader_config: Address,
    /// SD collateral.
    pub sd_collateral: Address,
    /// Penalty tracker.
    pub penalty_tracker: Address,
    /// Permissionless socializing pool.
    pub socializing_pool: Address,
    /// Stake pool manager.
    pub stake_pool_manager: Address,
    /// ETHx token.
    pub ethx: Address,
}

impl ContractAddresses {
    /// Names of the entries that are still the zero address.
    pub fn unset(&self) -> Vec<&'static str> {
        [
            ("permissionless-node-registry", self.permissionless_node_registry),
            ("pool-utils", self.pool_utils),
            ("stader-config", self.stader_config),
            ("sd-collateral", self.sd_collateral),
            ("penalty-tracker", self.penalty_tracker),
            ("socializing-pool", self.socializing_pool),
            ("stake-pool-manager", self.stake_pool_manager),
            ("ethx", self.ethx),
        ]
        .into_iter()
        .filter(|(_, address)| address.is_zero())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Settings shared by the JSON-RPC and beacon HTTP clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-call timeout.
    pub request_timeout: Duration,
    /// Maximum keys per beacon validator-status request.
    pub beacon_batch_size: usize,
    /// Whether the execution endpoint serves state at past blocks.
    pub archive: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            beacon_batch_size: 100,
            archive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_contracts() {
        let mut contracts = ContractAddresses::default();
        assert_eq!(contracts.unset().len(), 8);

        contracts.ethx = Address::repeat_byte(1);
        let unset = contracts.unset();
        assert_eq!(unset.len(), 7);
        assert!(!unset.contains(&"ethx"));
    }

    #[test]
    fn test_contracts_toml_keys() {
        let contracts = ContractAddresses {
            pool_utils: Address::repeat_byte(2),
            ..Default::default()
        };
        let text = toml::to_string(&contracts).unwrap();
        assert!(text.contains("pool-utils = \"0x0202020202020202020202020202020202020202\""));
    }
}
