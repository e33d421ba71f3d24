//! Error types for Tessera core.

use crate::entity::{EntityId, EntityKind};
use crate::types::TransactionId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Tessera core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing entity.
        what: String,
    },

    /// A revert or unrevert target is not in the log or redo buffer.
    #[error("transaction {id} not found")]
    TransactionNotFound {
        /// The requested transaction.
        id: TransactionId,
    },

    /// The log holds only the sentinel transaction.
    #[error("nothing to revert")]
    NothingToRevert,

    /// The redo buffer is empty.
    #[error("nothing to unrevert")]
    NothingToUnrevert,

    /// An argument was rejected before anything was mutated.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Why the argument was rejected.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation is not permitted.
        message: String,
    },

    /// An ID is already used by another type or instance.
    #[error("id already in use: {id}")]
    IdInUse {
        /// The conflicting ID.
        id: EntityId,
    },

    /// Random ID generation kept colliding.
    #[error("could not generate a unique id after {attempts} attempts")]
    IdExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// A restored entity has no container to live in.
    #[error("cannot restore {address}: containing entity is missing")]
    MissingContainer {
        /// Display form of the entity address.
        address: String,
    },

    /// A snapshot does not match the kind of its address.
    #[error("snapshot mismatch: address is {expected:?}, snapshot is {actual:?}")]
    SnapshotMismatch {
        /// Kind of the address.
        expected: EntityKind,
        /// Kind of the snapshot.
        actual: EntityKind,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if the error reports a missing entity or transaction.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. } | CoreError::TransactionNotFound { .. }
        )
    }
}
