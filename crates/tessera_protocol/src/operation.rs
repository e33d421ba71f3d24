//! Operation names and exchange identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A backend operation a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpType {
    /// Read the application settings, creating defaults on first run.
    LoadApplicationData,
    /// Overwrite the application settings.
    UpdateApplicationData,
    /// Read a project file.
    FetchProject,
    /// Write a project to its own path.
    SaveProject,
    /// Ask for a path, then write a project there.
    SaveProjectAs,
    /// Write a timestamped sibling copy of a project.
    BackupProject,
    /// Check that a directory is writable.
    TestPath,
    /// Let the user pick a directory.
    SelectDirectoryDialog,
    /// Let the user pick a file.
    SelectFileDialog,
}

impl OpType {
    /// Every operation, in table order.
    pub const ALL: [OpType; 9] = [
        OpType::LoadApplicationData,
        OpType::UpdateApplicationData,
        OpType::FetchProject,
        OpType::SaveProject,
        OpType::SaveProjectAs,
        OpType::BackupProject,
        OpType::TestPath,
        OpType::SelectDirectoryDialog,
        OpType::SelectFileDialog,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OpType::LoadApplicationData => "loadApplicationData",
            OpType::UpdateApplicationData => "updateApplicationData",
            OpType::FetchProject => "fetchProject",
            OpType::SaveProject => "saveProject",
            OpType::SaveProjectAs => "saveProjectAs",
            OpType::BackupProject => "backupProject",
            OpType::TestPath => "testPath",
            OpType::SelectDirectoryDialog => "selectDirectoryDialog",
            OpType::SelectFileDialog => "selectFileDialog",
        }
    }

    /// Returns true if the operation waits on the user.
    ///
    /// Such exchanges are usually issued without a timeout.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(
            self,
            OpType::SaveProjectAs | OpType::SelectDirectoryDialog | OpType::SelectFileDialog
        )
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation a `reply` or `error` frame answers.
///
/// Usually a known [`OpType`]. A request naming an operation the backend does
/// not know is still answered with an `error` frame; its raw name is echoed
/// as [`OpName::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpName {
    /// An operation of the table.
    Known(OpType),
    /// Any other name, as it appeared on the wire.
    Unknown(String),
}

impl OpName {
    /// Parses a wire name, falling back to [`OpName::Unknown`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match OpType::ALL.into_iter().find(|op| op.as_str() == name) {
            Some(op) => OpName::Known(op),
            None => OpName::Unknown(name.to_string()),
        }
    }

    /// Returns the operation, if it is a known one.
    #[must_use]
    pub fn known(&self) -> Option<OpType> {
        match self {
            OpName::Known(op) => Some(*op),
            OpName::Unknown(_) => None,
        }
    }

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OpName::Known(op) => op.as_str(),
            OpName::Unknown(name) => name,
        }
    }
}

impl From<OpType> for OpName {
    fn from(op: OpType) -> Self {
        OpName::Known(op)
    }
}

impl PartialEq<OpType> for OpName {
    fn eq(&self, other: &OpType) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for OpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlates a reply with its request.
///
/// Formatted as `<opType>-<unixMillis>-<sequence>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates exchange IDs that are unique within one generator.
///
/// The sequence number makes two IDs for the same operation issued in the
/// same millisecond distinct.
#[derive(Debug, Default)]
pub struct ExchangeIdGen {
    sequence: AtomicU64,
}

impl ExchangeIdGen {
    /// Creates a generator starting at sequence 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sequence: AtomicU64::new(0),
        }
    }

    /// Returns the next ID for `op`.
    pub fn next(&self, op: OpType) -> ExchangeId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        ExchangeId(format!("{op}-{}-{sequence}", unix_millis()))
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
