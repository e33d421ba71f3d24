//! Store configuration.

/// Configuration for an [`crate::AtomicFileStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Suffix appended to the target file name for the staging write.
    pub temp_suffix: String,

    /// Whether to `fsync` staged and backup files before they become visible.
    pub sync_on_write: bool,

    /// How many disambiguated names to try when a backup name is taken.
    pub max_backup_attempts: u32,

    /// Whether to pretty-print documents.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            temp_suffix: ".temp".to_string(),
            sync_on_write: true,
            max_backup_attempts: 64,
            pretty: true,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the staging file suffix.
    #[must_use]
    pub fn temp_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temp_suffix = suffix.into();
        self
    }

    /// Sets whether written files are synced to disk.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the number of backup names to try.
    #[must_use]
    pub const fn max_backup_attempts(mut self, attempts: u32) -> Self {
        self.max_backup_attempts = attempts;
        self
    }

    /// Sets whether documents are pretty-printed.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.temp_suffix, ".temp");
        assert!(config.sync_on_write);
        assert!(config.max_backup_attempts > 0);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .temp_suffix(".staging")
            .sync_on_write(false)
            .max_backup_attempts(3);

        assert_eq!(config.temp_suffix, ".staging");
        assert!(!config.sync_on_write);
        assert_eq!(config.max_backup_attempts, 3);
    }
}
