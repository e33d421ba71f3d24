//! Error types for the exchange client.

use std::time::Duration;
use tessera_protocol::{ErrorKind, ErrorPayload, ExchangeId, OpType, ProtocolError};
use thiserror::Error;

/// Result type for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Errors that can end an exchange.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// No reply arrived in time. The pending slot has been released.
    #[error("{op} exchange {exchange_id} timed out after {after:?}")]
    Timeout {
        /// Requested operation.
        op: OpType,
        /// The exchange that timed out.
        exchange_id: ExchangeId,
        /// The deadline that passed.
        after: Duration,
    },

    /// The backend answered with an `error` reply.
    #[error("{op} rejected: {payload}")]
    Rejected {
        /// Requested operation.
        op: OpType,
        /// The backend's error.
        payload: ErrorPayload,
    },

    /// A frame or payload could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Reading or writing the channel failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel closed before the reply arrived.
    #[error("exchange channel closed")]
    Closed,
}

impl ExchangeError {
    /// Returns the wire-level classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExchangeError::Timeout { .. } => ErrorKind::Timeout,
            ExchangeError::Rejected { payload, .. } => payload.kind,
            ExchangeError::Protocol(_) => ErrorKind::ProtocolMismatch,
            ExchangeError::Io(_) | ExchangeError::Closed => ErrorKind::IoFailure,
        }
    }

    /// Returns true if repeating the exchange may succeed.
    ///
    /// Exchanges are never retried automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExchangeError::Timeout { .. } | ExchangeError::Io(_) => true,
            ExchangeError::Rejected { payload, .. } => payload.kind == ErrorKind::IoFailure,
            ExchangeError::Protocol(_) | ExchangeError::Closed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let timeout = ExchangeError::Timeout {
            op: OpType::TestPath,
            exchange_id: ExchangeId::new("t"),
            after: Duration::from_secs(30),
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert!(timeout.is_retryable());

        let rejected = ExchangeError::Rejected {
            op: OpType::SaveProject,
            payload: ErrorPayload::new(ErrorKind::InvalidArgument, "root"),
        };
        assert_eq!(rejected.kind(), ErrorKind::InvalidArgument);
        assert!(!rejected.is_retryable());

        assert!(!ExchangeError::Closed.is_retryable());
    }

    #[test]
    fn display() {
        let err = ExchangeError::Rejected {
            op: OpType::FetchProject,
            payload: ErrorPayload::new(ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "fetchProject rejected: not found: no such file");
    }
}
