//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tally_types::{GrowthPolicy, LedgerParams, QuorumRule, DEFAULT_MAX_ACCOUNT_BYTES};

use crate::{LogFormat, NodeError};

/// Where accounts are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Durable LMDB environment under `data_dir`.
    #[default]
    Lmdb,
    /// Process-local, lost on exit.
    Memory,
}

/// Configuration for a tally node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageBackend,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Distance between a block and its chained predecessor.
    #[serde(default = "default_window_size")]
    pub window_size: u64,

    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    #[serde(default)]
    pub growth: GrowthPolicy,

    #[serde(default = "default_max_hash_entries")]
    pub max_hash_entries: usize,

    #[serde(default = "default_max_voters_per_hash")]
    pub max_voters_per_hash: usize,

    #[serde(default = "default_max_accounting_rows")]
    pub max_accounting_rows: usize,

    /// Ceiling on the encoded size of one account.
    #[serde(default = "default_max_account_bytes")]
    pub max_account_bytes: usize,

    #[serde(default)]
    pub quorum: QuorumRule,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tally_data")
}

fn default_map_size() -> usize {
    1 << 30
}

fn default_window_size() -> u64 {
    LedgerParams::default().window_size
}

fn default_initial_capacity() -> usize {
    LedgerParams::default().initial_capacity
}

fn default_max_hash_entries() -> usize {
    LedgerParams::default().max_hash_entries
}

fn default_max_voters_per_hash() -> usize {
    LedgerParams::default().max_voters_per_hash
}

fn default_max_accounting_rows() -> usize {
    LedgerParams::default().max_accounting_rows
}

fn default_max_account_bytes() -> usize {
    DEFAULT_MAX_ACCOUNT_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The ledger parameters this configuration describes.
    pub fn ledger_params(&self) -> LedgerParams {
        LedgerParams {
            window_size: self.window_size,
            initial_capacity: self.initial_capacity,
            growth: self.growth,
            max_hash_entries: self.max_hash_entries,
            max_voters_per_hash: self.max_voters_per_hash,
            max_accounting_rows: self.max_accounting_rows,
            max_account_bytes: self.max_account_bytes,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: StorageBackend::default(),
            map_size: default_map_size(),
            window_size: default_window_size(),
            initial_capacity: default_initial_capacity(),
            growth: GrowthPolicy::default(),
            max_hash_entries: default_max_hash_entries(),
            max_voters_per_hash: default_max_voters_per_hash(),
            max_accounting_rows: default_max_accounting_rows(),
            max_account_bytes: default_max_account_bytes(),
            quorum: QuorumRule::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.ledger_params(), config.ledger_params());
        assert_eq!(parsed.storage, config.storage);
        assert_eq!(parsed.quorum, config.quorum);
        assert_eq!(parsed.map_size, config.map_size);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.data_dir, PathBuf::from("./tally_data"));
        assert_eq!(config.storage, StorageBackend::Lmdb);
        assert_eq!(config.window_size, 100);
        assert_eq!(config.max_account_bytes, 10 * 1024 * 1024);
        assert_eq!(config.quorum, QuorumRule::Plurality);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.ledger_params(), LedgerParams::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            storage = "memory"
            window_size = 10
            quorum = "strict_majority"
            log_format = "json"
            growth = { increment = 8 }
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.quorum, QuorumRule::StrictMajority);
        assert_eq!(config.log_format, LogFormat::Json);
        let params = config.ledger_params();
        assert_eq!(params.window_size, 10);
        assert_eq!(params.growth, GrowthPolicy::Increment(8));
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn unknown_storage_is_rejected() {
        let result = NodeConfig::from_toml_str(r#"storage = "rocksdb""#);
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/tally.toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }
}
