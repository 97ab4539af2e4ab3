//! Agent configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rollcall_store_lmdb::DEFAULT_MAP_SIZE;
use rollcall_types::{SubmissionParams, VerificationParams};

use crate::{LogFormat, NodeError};

/// Configuration for a Rollcall agent.
///
/// Can be loaded from a TOML file via [`AgentConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Hex-encoded public keys of trusted claim issuers.
    #[serde(default)]
    pub trusted_issuers: Vec<String>,

    /// Base URL of the ledger relay.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    #[serde(default)]
    pub verification: VerificationParams,

    #[serde(default)]
    pub submission: SubmissionParams,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./rollcall_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_relay_url() -> String {
    "http://127.0.0.1:7080".to_string()
}

impl AgentConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            map_size: default_map_size(),
            trusted_issuers: Vec::new(),
            relay_url: default_relay_url(),
            verification: VerificationParams::default(),
            submission: SubmissionParams::default(),
        }
    }
}
