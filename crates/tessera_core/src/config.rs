//! History configuration.

/// Configuration for a project's transaction log.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of changes kept inside one transaction.
    ///
    /// When exceeded, the oldest change of that transaction is evicted.
    /// Transactions themselves are never evicted by this limit.
    pub max_changes_per_transaction: usize,

    /// How many random IDs to try before giving up on a collision.
    pub id_attempts: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_changes_per_transaction: 200,
            id_attempts: 16,
        }
    }
}

impl HistoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-transaction change cap.
    #[must_use]
    pub const fn max_changes_per_transaction(mut self, cap: usize) -> Self {
        self.max_changes_per_transaction = cap;
        self
    }

    /// Sets the number of ID generation attempts.
    #[must_use]
    pub const fn id_attempts(mut self, attempts: u32) -> Self {
        self.id_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_changes_per_transaction, 200);
        assert_eq!(config.id_attempts, 16);
    }

    #[test]
    fn builder_pattern() {
        let config = HistoryConfig::new()
            .max_changes_per_transaction(10)
            .id_attempts(2);

        assert_eq!(config.max_changes_per_transaction, 10);
        assert_eq!(config.id_attempts, 2);
    }
}
