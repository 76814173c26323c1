//! Engine-wide configuration: migration batching, the policy manager
//! toggle, the TEMPERATURE background tick rate, and opaque per-adapter
//! config blobs. Loaded from a TOML file or built up with the `clap`
//! derive for the CLI's `run` subcommand; both paths produce the same
//! [`EngineConfig`].

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// How often the TEMPERATURE background reclassification tick runs.
/// `EveryMinutes(0)` is rejected by `EngineConfig::validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingInterval {
    EverySecond,
    EveryMinute,
    EveryMinutes(u32),
    EveryHour,
}

impl Default for ProcessingInterval {
    fn default() -> Self {
        ProcessingInterval::EveryMinute
    }
}

impl ProcessingInterval {
    pub fn as_duration(&self) -> std::time::Duration {
        match self {
            ProcessingInterval::EverySecond => std::time::Duration::from_secs(1),
            ProcessingInterval::EveryMinute => std::time::Duration::from_secs(60),
            ProcessingInterval::EveryMinutes(n) => std::time::Duration::from_secs(60 * u64::from(*n)),
            ProcessingInterval::EveryHour => std::time::Duration::from_secs(3600),
        }
    }
}

fn default_batch_size() -> usize {
    migrator::DEFAULT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

/// Opaque per-adapter configuration, recognized but not interpreted by the
/// engine: `maxConnections`, `path`, `trxControlMode`, `trxIsolationLevel`,
/// `type`, `tableType`, `mode`, plus whatever else a given adapter needs.
/// Carried as a JSON blob since the set of keys is adapter-specific.
pub type AdapterConfig = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows per migration batch; mirrors `migrator::DataMigrator::with_batch_size`.
    #[serde(default = "default_batch_size")]
    pub data_migrator_batch_size: usize,
    /// Enables the policy manager. The policy manager itself is a
    /// collaborator outside this engine's core; this flag only gates
    /// whether the engine consults one at all.
    #[serde(default = "default_true")]
    pub policy_enabled: bool,
    #[serde(default)]
    pub partition_frequency_processing_interval: ProcessingInterval,
    /// unique_name -> adapter config blob, applied when that adapter is
    /// registered.
    #[serde(default)]
    pub adapters: HashMap<String, AdapterConfig>,
    /// Where the persisted catalog is read from at startup and written to
    /// on a clean shutdown. `None` runs with an empty, unpersisted catalog.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_migrator_batch_size: default_batch_size(),
            policy_enabled: true,
            partition_frequency_processing_interval: ProcessingInterval::default(),
            adapters: HashMap::new(),
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|source| Error::Config { message: source.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|source| Error::Config { message: format!("reading {}: {source}", path.as_ref().display()) })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_migrator_batch_size == 0 {
            return Err(Error::Config { message: "data_migrator_batch_size must be nonzero".to_string() });
        }
        if let ProcessingInterval::EveryMinutes(0) = self.partition_frequency_processing_interval {
            return Err(Error::Config { message: "partition_frequency_processing_interval must be nonzero".to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.data_migrator_batch_size, migrator::DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn parses_recognized_options() {
        let toml = r#"
            data_migrator_batch_size = 500
            policy_enabled = false
            partition_frequency_processing_interval = { every_minutes = 10 }

            [adapters.hsqldb]
            maxConnections = 25
            path = "./data"
            type = "Store"
        "#;
        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.data_migrator_batch_size, 500);
        assert!(!config.policy_enabled);
        assert_eq!(config.partition_frequency_processing_interval, ProcessingInterval::EveryMinutes(10));
        assert_eq!(config.adapters["hsqldb"]["maxConnections"], 25);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = EngineConfig { data_migrator_batch_size: 0, ..EngineConfig::default() };
        assert!(config.validate().is_err());
    }
}
