//! Validator records as stored in the permissionless node registry.

use crate::operator::OperatorId;
use crate::pubkey::ValidatorPubkey;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry-assigned validator id (dense, starts at 1).
pub type ValidatorId = u64;

/// Validator lifecycle as recorded by the registry contract.
///
/// Discriminants match the contract's `ValidatorStatus` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ValidatorContractStatus {
    /// Key added, awaiting verification.
    Initialized = 0,
    /// Flagged for an invalid deposit signature.
    InvalidSignature = 1,
    /// Flagged as front-run.
    FrontRun = 2,
    /// Pre-deposit made; ready for the full deposit.
    PreDeposit = 3,
    /// Fully deposited on the beacon chain.
    Deposited = 4,
    /// Exited and withdrawn.
    Withdrawn = 5,
}

impl ValidatorContractStatus {
    /// Terminal keys no longer count against an operator's key limit.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::InvalidSignature | Self::FrontRun | Self::Withdrawn
        )
    }

    /// Short label used in status output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::InvalidSignature => "invalid_signature",
            Self::FrontRun => "front_run",
            Self::PreDeposit => "pre_deposit",
            Self::Deposited => "deposited",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl TryFrom<u8> for ValidatorContractStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Initialized,
            1 => Self::InvalidSignature,
            2 => Self::FrontRun,
            3 => Self::PreDeposit,
            4 => Self::Deposited,
            5 => Self::Withdrawn,
            other => return Err(other),
        })
    }
}

impl fmt::Display for ValidatorContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validator key as recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    /// Registry-assigned id.
    pub id: ValidatorId,
    /// BLS public key; the natural unique key.
    pub pubkey: ValidatorPubkey,
    /// Owning operator.
    pub operator_id: OperatorId,
    /// Lifecycle status as recorded on-chain.
    pub status: ValidatorContractStatus,
    /// Withdrawal vault collecting this validator's rewards and principal.
    pub withdraw_vault: Address,
    /// Block the full deposit landed in (0 if not deposited).
    pub deposit_block: u64,
    /// Block the withdrawal was recorded in (0 if not withdrawn).
    pub withdrawn_block: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_status_from_u8() {
        assert_eq!(
            ValidatorContractStatus::try_from(4u8),
            Ok(ValidatorContractStatus::Deposited)
        );
        assert_eq!(ValidatorContractStatus::try_from(9u8), Err(9));
    }

    #[test]
    fn test_contract_status_terminal() {
        assert!(ValidatorContractStatus::Withdrawn.is_terminal());
        assert!(ValidatorContractStatus::FrontRun.is_terminal());
        assert!(ValidatorContractStatus::InvalidSignature.is_terminal());
        assert!(!ValidatorContractStatus::Deposited.is_terminal());
        assert!(!ValidatorContractStatus::Initialized.is_terminal());
    }
}
