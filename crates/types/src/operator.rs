//! Node operator records as stored in the permissionless node registry.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// On-chain operator id. Ids are dense and start at 1; 0 means "not registered".
pub type OperatorId = u64;

/// A registered node operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    /// Registry-assigned operator id.
    pub id: OperatorId,
    /// Address the operator registered from.
    pub operator_address: Address,
    /// Address receiving operator rewards.
    pub reward_address: Address,
    /// Human-readable operator name.
    pub name: String,
    /// Whether the operator is currently active.
    pub active: bool,
    /// Whether the operator opted into the socializing pool.
    pub opted_for_socializing_pool: bool,
}

impl OperatorRecord {
    /// The zeroed record the registry returns for an unknown id.
    pub fn unregistered(id: OperatorId) -> Self {
        Self {
            id,
            operator_address: Address::ZERO,
            reward_address: Address::ZERO,
            name: String::new(),
            active: false,
            opted_for_socializing_pool: false,
        }
    }

    /// The registry returns a zeroed struct for unknown ids; an empty name is
    /// how an unregistered operator shows up.
    pub fn is_registered(&self) -> bool {
        self.id != 0 && !self.name.is_empty()
    }
}
