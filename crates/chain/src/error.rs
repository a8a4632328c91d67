//! Errors returned by the chain registry and beacon source clients.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single registry or beacon read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Connection-level failure (refused, reset, DNS, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint did not answer within the client's per-call timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A contract view call reverted.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The requested object does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// The upstream answered with something structurally wrong.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result alias for collaborator calls.
pub type ChainResult<T> = Result<T, ChainError>;

impl ChainError {
    /// Whether a later retry of the same read can plausibly succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<jsonrpsee::core::ClientError> for ChainError {
    fn from(err: jsonrpsee::core::ClientError) -> Self {
        use jsonrpsee::core::ClientError;
        match err {
            ClientError::Call(obj) => Self::Reverted(obj.message().to_string()),
            ClientError::RequestTimeout => Self::Timeout(Duration::ZERO),
            ClientError::ParseError(e) => Self::Decode(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<alloy_sol_types::Error> for ChainError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ChainError::Reverted("operator not found".to_string());
        assert_eq!(err.to_string(), "call reverted: operator not found");

        let err = ChainError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));
    }

    #[test]
    fn test_is_retriable() {
        assert!(ChainError::Transport("reset".into()).is_retriable());
        assert!(ChainError::Timeout(Duration::from_secs(1)).is_retriable());

        assert!(!ChainError::Reverted("x".into()).is_retriable());
        assert!(!ChainError::Decode("x".into()).is_retriable());
        assert!(!ChainError::NotFound("x".into()).is_retriable());
    }
}
