use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for a [`ConnectedStore`](crate::ConnectedStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long a fetch waits for the next response before checking
    /// whether it has already seen an error.
    #[serde(with = "dhtkv_types::millis")]
    pub fetch_timeout: Duration,
    /// Interval between keep-alive rounds.
    #[serde(with = "dhtkv_types::millis")]
    pub refresh_interval: Duration,
    /// Fan-out for puts that do not name one. `None` defers to the table.
    pub default_copies: Option<usize>,
    /// Responder count for fetches that do not name one. `None` defers to the table.
    pub default_reads: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            refresh_interval: Duration::from_secs(30),
            default_copies: None,
            default_reads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.fetch_timeout, Duration::from_secs(10));
        assert_eq!(c.refresh_interval, Duration::from_secs(30));
        assert!(c.default_copies.is_none());
        assert!(c.default_reads.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: StoreConfig = toml::from_str("refresh_interval = 4000\ndefault_copies = 3").unwrap();
        assert_eq!(c.refresh_interval, Duration::from_secs(4));
        assert_eq!(c.default_copies, Some(3));
        assert_eq!(c.fetch_timeout, Duration::from_secs(10));
    }
}
