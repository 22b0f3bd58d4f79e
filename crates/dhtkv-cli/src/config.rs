use std::path::Path;

use anyhow::Context;
use dhtkv_core::StoreConfig;
use dhtkv_table::TableConfig;
use serde::{Deserialize, Serialize};

/// Settings file for `dhtkv session`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Number of simulated nodes.
    pub nodes: usize,
    pub store: StoreConfig,
    pub table: TableConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            nodes: 16,
            store: StoreConfig::default(),
            table: TableConfig::default(),
        }
    }
}

impl CliConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config() {
        let c = CliConfig::default();
        assert_eq!(c.nodes, 16);
        assert_eq!(c.table.default_replicas, 8);
        assert_eq!(c.store.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_path_gives_defaults() {
        let c = CliConfig::load(None).unwrap();
        assert_eq!(c.nodes, 16);
    }

    #[test]
    fn load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dhtkv.toml");
        std::fs::write(
            &path,
            "nodes = 5\n\n[store]\nrefresh_interval = 2000\n\n[table]\ndefault_replicas = 3\nlatency = 10\n",
        )
        .unwrap();

        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.nodes, 5);
        assert_eq!(c.store.refresh_interval, Duration::from_secs(2));
        assert_eq!(c.store.fetch_timeout, Duration::from_secs(10));
        assert_eq!(c.table.default_replicas, 3);
        assert_eq!(c.table.latency, Duration::from_millis(10));
        assert_eq!(c.table.channel_capacity, 64);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "nodes = \"many\"").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());
    }
}
