//! Error types for store operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The caller passed an argument the store refuses to act on.
    ///
    /// No filesystem access has been attempted when this is returned.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Why the argument was rejected.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path the failing operation touched.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A file exists but does not contain a valid document.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// The file that failed to decode.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be serialized.
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    /// Every candidate backup name was already taken.
    #[error("no free backup name next to {} after {attempts} attempts", path.display())]
    BackupNameExhausted {
        /// The base backup path.
        path: PathBuf,
        /// How many names were tried.
        attempts: u32,
    },
}

impl StoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the path involved in the failure, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreError::Io { path, .. }
            | StoreError::Decode { path, .. }
            | StoreError::BackupNameExhausted { path, .. } => Some(path),
            StoreError::InvalidArgument { .. } | StoreError::Encode(_) => None,
        }
    }

    /// Returns true if the request was rejected before touching the filesystem.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StoreError::InvalidArgument { .. })
    }

    /// Returns true if the failure is an I/O "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
