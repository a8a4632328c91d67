//! Consensus-layer validator status and slot/block pairing.

use crate::pubkey::ValidatorPubkey;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Beacon API validator state (`/eth/v1/beacon/states/{id}/validators`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeaconValidatorState {
    /// Deposit seen, not yet eligible for activation.
    PendingInitialized,
    /// Eligible, waiting in the activation queue.
    PendingQueued,
    /// Active with no exit scheduled.
    ActiveOngoing,
    /// Active with a voluntary exit scheduled.
    ActiveExiting,
    /// Active, slashed, and being ejected.
    ActiveSlashed,
    /// Exited without being slashed, not yet withdrawable.
    ExitedUnslashed,
    /// Exited after being slashed, not yet withdrawable.
    ExitedSlashed,
    /// Withdrawable epoch reached, balance not yet swept.
    WithdrawalPossible,
    /// Balance swept.
    WithdrawalDone,
}

impl BeaconValidatorState {
    /// Wire name used by the beacon API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingInitialized => "pending_initialized",
            Self::PendingQueued => "pending_queued",
            Self::ActiveOngoing => "active_ongoing",
            Self::ActiveExiting => "active_exiting",
            Self::ActiveSlashed => "active_slashed",
            Self::ExitedUnslashed => "exited_unslashed",
            Self::ExitedSlashed => "exited_slashed",
            Self::WithdrawalPossible => "withdrawal_possible",
            Self::WithdrawalDone => "withdrawal_done",
        }
    }
}

impl fmt::Display for BeaconValidatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeaconValidatorState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending_initialized" => Self::PendingInitialized,
            "pending_queued" => Self::PendingQueued,
            "active_ongoing" => Self::ActiveOngoing,
            "active_exiting" => Self::ActiveExiting,
            "active_slashed" => Self::ActiveSlashed,
            "exited_unslashed" => Self::ExitedUnslashed,
            "exited_slashed" => Self::ExitedSlashed,
            "withdrawal_possible" => Self::WithdrawalPossible,
            "withdrawal_done" => Self::WithdrawalDone,
            other => return Err(format!("unknown validator state: {other}")),
        })
    }
}

/// A validator's consensus-layer status at one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconValidatorStatus {
    /// Validator public key.
    pub pubkey: ValidatorPubkey,
    /// Beacon validator index.
    pub index: u64,
    /// Lifecycle state.
    pub state: BeaconValidatorState,
    /// Slashed flag as reported by the beacon node.
    pub slashed: bool,
    /// Current balance in gwei.
    pub balance_gwei: u64,
    /// Activation epoch (`u64::MAX` when unset).
    pub activation_epoch: u64,
    /// Exit epoch (`u64::MAX` when unset).
    pub exit_epoch: u64,
    /// Withdrawable epoch (`u64::MAX` when unset).
    pub withdrawable_epoch: u64,
}

/// The execution block that was canonical at a beacon slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionBlockRef {
    /// Beacon slot that carried the payload.
    pub slot: u64,
    /// Execution block number.
    pub block_number: u64,
    /// Execution block hash.
    pub block_hash: B256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        for state in [
            BeaconValidatorState::PendingInitialized,
            BeaconValidatorState::PendingQueued,
            BeaconValidatorState::ActiveOngoing,
            BeaconValidatorState::ActiveExiting,
            BeaconValidatorState::ActiveSlashed,
            BeaconValidatorState::ExitedUnslashed,
            BeaconValidatorState::ExitedSlashed,
            BeaconValidatorState::WithdrawalPossible,
            BeaconValidatorState::WithdrawalDone,
        ] {
            assert_eq!(state.as_str().parse::<BeaconValidatorState>(), Ok(state));
        }
    }

    #[test]
    fn test_state_serde_matches_wire_name() {
        let json = serde_json::to_string(&BeaconValidatorState::ActiveSlashed).unwrap();
        assert_eq!(json, "\"active_slashed\"");
    }

    #[test]
    fn test_unknown_state() {
        assert!("active".parse::<BeaconValidatorState>().is_err());
    }
}
