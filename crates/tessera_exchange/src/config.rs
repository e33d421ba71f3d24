//! Configuration for the exchange client.

use std::time::Duration;

/// Configuration for an [`crate::ExchangeClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long an exchange waits for its reply.
    pub timeout: Duration,
    /// Whether interactive operations (dialogs) skip the timeout.
    pub interactive_without_timeout: bool,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interactive_without_timeout: true,
        }
    }

    /// Sets the exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Applies the timeout to interactive operations too.
    pub fn with_interactive_timeout(mut self) -> Self {
        self.interactive_without_timeout = false;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.interactive_without_timeout);
    }

    #[test]
    fn builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_millis(250))
            .with_interactive_timeout();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(!config.interactive_without_timeout);
    }
}
