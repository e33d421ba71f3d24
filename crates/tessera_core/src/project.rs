//! The project document exchanged with the backend and stored on disk.

use crate::entity::{EntityId, InstanceMap, TypeWrapper};
use crate::layout::Layout;
use crate::transaction::Transaction;
use crate::types::BoardId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A whole project graph: content, layout and transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Where the project was last saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Display name.
    pub name: String,
    /// Types by ID.
    #[serde(default)]
    pub types: BTreeMap<EntityId, TypeWrapper>,
    /// Instances by type ID.
    #[serde(default)]
    pub instances: BTreeMap<EntityId, InstanceMap>,
    /// UI layout.
    #[serde(default)]
    pub layout: Layout,
    /// Transaction log, sentinel first.
    #[serde(default)]
    pub recent_changes: Vec<Transaction>,
}

impl Project {
    /// Creates an empty, unsaved project with one main board.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            path: None,
            name: name.into(),
            types: BTreeMap::new(),
            instances: BTreeMap::new(),
            layout: Layout::with_main_board(BoardId::generate(), "Main"),
            recent_changes: vec![Transaction::sentinel()],
        }
    }

    /// Sets the save path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Splits the save path into directory and file name.
    ///
    /// Returns `None` for an unsaved project or a path without file name.
    /// A bare file name is placed in the current directory `.`.
    #[must_use]
    pub fn location(&self) -> Option<(PathBuf, String)> {
        let path = self.path.as_deref()?;
        let file_name = path.file_name()?.to_str()?.to_string();
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Some((directory.to_path_buf(), file_name))
    }

    /// Returns the number of instances over all types.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.values().map(BTreeMap::len).sum()
    }
}
