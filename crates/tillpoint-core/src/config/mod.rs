//! Configuration for the sync layer, loadable from TOML.

pub mod defaults;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{TillpointError, TillpointResult};

/// Top-level configuration. Every section and field has a default, so an
/// empty TOML document (or no file at all) yields a working config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub replay: ReplayConfig,
}

/// Server API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are resolved against.
    pub base_url: String,
    /// Per-request timeout (seconds). Applied by the transport to every
    /// call so a hung request cannot block its caller indefinitely.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_BASE_URL.to_string(),
            timeout_secs: defaults::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Local store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(defaults::DEFAULT_DB_PATH),
        }
    }
}

/// Replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Retriable failures beyond this count demote the mutation to the
    /// dead-letter queue.
    pub max_attempts: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_MAX_REPLAY_ATTEMPTS,
        }
    }
}

impl SyncConfig {
    /// Parse a TOML document. Unknown keys are ignored; missing keys fall
    /// back to defaults.
    pub fn from_toml_str(s: &str) -> TillpointResult<Self> {
        toml::from_str(s).map_err(|e| TillpointError::ConfigError {
            reason: e.to_string(),
        })
    }

    /// Load from a TOML file on disk.
    pub fn load(path: &Path) -> TillpointResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TillpointError::ConfigError {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }
}
