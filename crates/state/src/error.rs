//! State engine error types

use alloy_primitives::Address;
use stader_chain::ChainError;
use stader_types::OperatorId;
use thiserror::Error;

/// Failure of a snapshot build.
#[derive(Debug, Error)]
pub enum StateError {
    /// The beacon node has no block at this slot (missed or orphaned).
    #[error("no beacon block at slot {slot}")]
    SlotNotFound {
        /// Requested slot.
        slot: u64,
    },

    /// A key index resolved to a validator id the registry does not know.
    #[error("validator at index {index} of operator {operator_id} not found in registry")]
    ValidatorNotFound {
        /// Owning operator.
        operator_id: OperatorId,
        /// Key index within the operator's list.
        index: u64,
    },

    /// The execution block reported for a slot is not the block the
    /// execution node has at that height.
    #[error("slot {slot} and execution block {execution_block} do not pair: {reason}")]
    InconsistentPairing {
        /// Beacon slot.
        slot: u64,
        /// Execution block number reported by the beacon node.
        execution_block: u64,
        /// What did not match.
        reason: String,
    },

    /// A registry or beacon read failed.
    #[error("{context}: {source}")]
    Upstream {
        /// What was being read (operator id, public key, slot).
        context: String,
        /// Originating failure.
        #[source]
        source: ChainError,
    },

    /// The build was cancelled before it finished.
    #[error("snapshot build cancelled")]
    Cancelled,
}

/// Coarse failure class of a [`StateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Expected absence; retry with different input.
    NotFound,
    /// A collaborator call failed.
    UpstreamFailure,
    /// Slot and block failed the pairing check.
    InconsistentPairing,
    /// Shutdown interrupted the build.
    Cancelled,
}

impl StateError {
    /// Failure class for retry decisions and reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SlotNotFound { .. } | Self::ValidatorNotFound { .. } => ErrorKind::NotFound,
            Self::Upstream { .. } => ErrorKind::UpstreamFailure,
            Self::InconsistentPairing { .. } => ErrorKind::InconsistentPairing,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Result type for snapshot builds
pub type Result<T> = std::result::Result<T, StateError>;

/// Attach read context to collaborator results.
pub trait ChainResultExt<T> {
    /// Wrap an error as [`StateError::Upstream`] with a lazily built context.
    fn upstream<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ChainResultExt<T> for std::result::Result<T, ChainError> {
    fn upstream<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| StateError::Upstream {
            context: context().into(),
            source,
        })
    }
}

/// Failure of a cache read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// No snapshot has been built yet.
    #[error("no snapshot available yet")]
    NotReady,

    /// The cache tracks a different operator.
    #[error("operator {requested} is not tracked (tracking {tracked})")]
    OperatorNotTracked {
        /// Address asked for.
        requested: Address,
        /// Address the cache is built for.
        tracked: Address,
    },

    /// The cache was closed.
    #[error("snapshot cache closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(StateError::SlotNotFound { slot: 1 }.kind(), ErrorKind::NotFound);
        assert_eq!(
            StateError::ValidatorNotFound {
                operator_id: 1,
                index: 0
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(StateError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_upstream_context() {
        let result: std::result::Result<(), ChainError> =
            Err(ChainError::Reverted("bad id".into()));
        let err = result.upstream(|| "validator record for operator 7").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert_eq!(
            err.to_string(),
            "validator record for operator 7: call reverted: bad id"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        let err = StateError::InconsistentPairing {
            slot: 10,
            execution_block: 20,
            reason: "hash mismatch".into(),
        };
        assert_eq!(
            err.to_string(),
            "slot 10 and execution block 20 do not pair: hash mismatch"
        );
        assert_eq!(
            CacheError::NotReady.to_string(),
            "no snapshot available yet"
        );
    }
}
