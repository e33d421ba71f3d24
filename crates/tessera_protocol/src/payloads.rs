//! Typed request payloads and reply data.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;

/// Classification of a failed exchange, shared by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// A file, path or transaction does not exist.
    NotFound,
    /// A read, write, rename, delete or mkdir failed.
    IoFailure,
    /// The request was rejected before anything was attempted.
    InvalidArgument,
    /// No reply arrived before the deadline.
    Timeout,
    /// A frame did not match any known message or exchange.
    ProtocolMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::IoFailure => "i/o failure",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ProtocolMismatch => "protocol mismatch",
        };
        f.write_str(name)
    }
}

/// The `data` of an `error` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human readable description.
    pub message: String,
    /// The failing path, for file errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ErrorPayload {
    /// Creates an error payload without path.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    /// Attaches the failing path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Reads an error payload out of reply data.
    ///
    /// Data that is not a structured payload is kept as the message of a
    /// [`ErrorKind::ProtocolMismatch`] payload.
    #[must_use]
    pub fn from_data(data: Value) -> Self {
        match serde_json::from_value::<ErrorPayload>(data.clone()) {
            Ok(payload) => payload,
            Err(_) => {
                let message = match data {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                Self::new(ErrorKind::ProtocolMismatch, message)
            }
        }
    }

    /// Converts to reply data.
    #[must_use]
    pub fn into_data(self) -> Value {
        let mut data = json!({
            "kind": self.kind,
            "message": self.message,
        });
        if let Some(path) = self.path {
            data["path"] = Value::String(path.to_string_lossy().into_owned());
        }
        data
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}

/// Payload of `backupProject`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRequest {
    /// Path of the project file to back up next to.
    pub path: PathBuf,
    /// The project graph.
    pub data: Value,
}

/// Payload of the dialog operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRequest {
    /// Label of the confirm button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_label: Option<String>,
    /// Where the dialog opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<PathBuf>,
}

impl DialogRequest {
    /// Creates a dialog request.
    #[must_use]
    pub fn new(button_label: impl Into<String>, default_path: Option<PathBuf>) -> Self {
        Self {
            button_label: Some(button_label.into()),
            default_path,
        }
    }
}

/// Result of `selectDirectoryDialog`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryDialogResult {
    /// True if the user dismissed the dialog.
    pub canceled: bool,
    /// The chosen directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Result of `selectFileDialog`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDialogResult {
    /// True if the user dismissed the dialog.
    pub canceled: bool,
    /// The chosen file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Result of `saveProject` and `backupProject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPath {
    /// Where the file was written.
    pub path: PathBuf,
}
