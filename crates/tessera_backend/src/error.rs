//! Error types for the backend.

use std::path::{Path, PathBuf};
use tessera_protocol::{ErrorKind, ErrorPayload, ProtocolError};
use tessera_storage::StoreError;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while serving a request.
#[derive(Error, Debug)]
pub enum BackendError {
    /// A file the request refers to does not exist.
    #[error("not found: {}", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// The request was refused before anything was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request payload did not match the operation.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ProtocolError),

    /// The file store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing to the channel failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns the wire-level classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::NotFound { .. } => ErrorKind::NotFound,
            BackendError::InvalidArgument(_) | BackendError::InvalidRequest(_) => {
                ErrorKind::InvalidArgument
            }
            BackendError::Store(e) if e.is_invalid_argument() => ErrorKind::InvalidArgument,
            BackendError::Store(e) if e.is_not_found() => ErrorKind::NotFound,
            BackendError::Store(_) | BackendError::Io(_) => ErrorKind::IoFailure,
        }
    }

    /// Returns the path involved in the failure, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            BackendError::NotFound { path } => Some(path),
            BackendError::Store(e) => e.path(),
            _ => None,
        }
    }

    /// Returns true if the client sent something the backend refuses.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BackendError::InvalidArgument(_) | BackendError::InvalidRequest(_)
        ) || matches!(self, BackendError::Store(e) if e.is_invalid_argument())
    }

    /// Converts to the payload of an `error` reply.
    pub fn to_payload(&self) -> ErrorPayload {
        let payload = ErrorPayload::new(self.kind(), self.to_string());
        match self.path() {
            Some(path) => payload.with_path(path),
            None => payload,
        }
    }
}
