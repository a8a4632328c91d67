//! Core types for the Stader node operator client.
//!
//! Plain data shared by the chain clients, the state aggregation engine and
//! the metrics exporter: registry records, beacon statuses and reward types.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod beacon;
pub mod operator;
pub mod pubkey;
pub mod rewards;
pub mod units;
pub mod validator;

pub use beacon::{BeaconValidatorState, BeaconValidatorStatus, ExecutionBlockRef};
pub use operator::{OperatorId, OperatorRecord};
pub use pubkey::{PubkeyError, ValidatorPubkey, VALIDATOR_PUBKEY_LEN};
pub use rewards::{
    PoolId, RewardCycleDetails, RewardParams, RewardShare, PERMISSIONLESS_POOL_ID,
};
pub use validator::{ValidatorContractStatus, ValidatorId, ValidatorRecord};
