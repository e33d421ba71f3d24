//! Backend configuration.

use std::path::{Path, PathBuf};

/// Configuration for the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Directory holding the application settings.
    pub app_data_dir: PathBuf,
    /// File name of the settings document inside `app_data_dir`.
    pub settings_file: String,
    /// File name written and removed by `testPath`.
    pub probe_file: String,
}

impl BackendConfig {
    /// Creates a configuration rooted at `app_data_dir`.
    pub fn new(app_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_data_dir: app_data_dir.into(),
            settings_file: "settings.json".to_string(),
            probe_file: ".tessera-probe".to_string(),
        }
    }

    /// Sets the settings file name.
    pub fn with_settings_file(mut self, name: impl Into<String>) -> Self {
        self.settings_file = name.into();
        self
    }

    /// Sets the probe file name.
    pub fn with_probe_file(mut self, name: impl Into<String>) -> Self {
        self.probe_file = name.into();
        self
    }

    /// Returns the full path of the settings document.
    pub fn settings_path(&self) -> PathBuf {
        self.app_data_dir.join(&self.settings_file)
    }

    /// Returns the application data directory.
    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(".tessera")
    }
}
