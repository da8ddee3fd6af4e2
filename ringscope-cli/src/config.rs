// src/config.rs

//! Inspector configuration.
//!
//! Stored as JSON. Every field has a default, so a partial file is valid;
//! command-line flags are applied on top of whatever the file sets.

use crate::errors::{CliError, Result};
use ringscope_core::DEFAULT_SNAPSHOT_PATH;
use ringscope_crypto::Network;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Report rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable walkthrough
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Complete inspector configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Chain snapshot to load
    pub bc_path: PathBuf,

    /// Network addresses are expected on
    pub network: Network,

    /// Print secret material (ephemeral keys, derivations) in reports and logs
    pub unsafe_diagnostics: bool,

    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Report format
    pub output: OutputFormat,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            bc_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            network: Network::Mainnet,
            unsafe_diagnostics: false,
            log_filter: "info".to_string(),
            output: OutputFormat::Text,
        }
    }
}

impl InspectorConfig {
    /// Loads configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| CliError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Saves configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
