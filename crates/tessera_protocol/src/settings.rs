//! Application settings persisted by the backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application-wide settings.
///
/// Missing keys in a stored settings file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Save the open project periodically.
    pub allow_autosave: bool,
    /// Minutes between autosaves.
    pub autosave_interval: u64,
    /// Write timestamped backups periodically.
    pub allow_backup: bool,
    /// Minutes between backups.
    pub backup_interval: u64,
    /// The project opened last.
    pub last_project_path: Option<PathBuf>,
    /// Default directory for new projects.
    pub default_local_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            allow_autosave: false,
            autosave_interval: 5,
            allow_backup: false,
            backup_interval: 15,
            last_project_path: None,
            default_local_path: None,
        }
    }
}

impl AppSettings {
    /// Returns the autosave period, if autosave is on.
    ///
    /// An interval of zero minutes counts as off.
    #[must_use]
    pub fn autosave_period(&self) -> Option<Duration> {
        period(self.allow_autosave, self.autosave_interval)
    }

    /// Returns the backup period, if backups are on.
    #[must_use]
    pub fn backup_period(&self) -> Option<Duration> {
        period(self.allow_backup, self.backup_interval)
    }
}

fn period(allowed: bool, minutes: u64) -> Option<Duration> {
    (allowed && minutes > 0).then(|| Duration::from_secs(minutes.saturating_mul(60)))
}
