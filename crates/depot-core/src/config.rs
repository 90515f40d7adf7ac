//! Configuration system for Depot.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $DEPOT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/depot/config.toml
//!   3. ~/.config/depot/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::wire;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Listen address for the daemon.
    pub host: String,
    /// TCP port for client connections.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of files exposed to clients. Created on startup if absent.
    pub files_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrently connected clients.
    pub max_clients: usize,
    /// Seconds to wait for a transfer readiness/ack frame. 0 = wait forever.
    pub ack_timeout_secs: u64,
}

impl LimitsConfig {
    /// The ack timeout as a `Duration`, `None` when disabled.
    pub fn ack_timeout(&self) -> Option<Duration> {
        (self.ack_timeout_secs > 0).then(|| Duration::from_secs(self.ack_timeout_secs))
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: wire::DEFAULT_PORT,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            files_dir: data_dir().join("files"),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_clients: wire::DEFAULT_MAX_CLIENTS,
            ack_timeout_secs: 0,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("depot")
}

/// Data directory for depot (file repository root lives under it).
pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("depot")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl DepotConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            DepotConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("DEPOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&DepotConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply DEPOT_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DEPOT_NETWORK__HOST") {
            self.network.host = v;
        }
        if let Ok(v) = std::env::var("DEPOT_NETWORK__PORT") {
            if let Ok(p) = v.parse() {
                self.network.port = p;
            }
        }
        if let Ok(v) = std::env::var("DEPOT_STORAGE__FILES_DIR") {
            self.storage.files_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEPOT_LIMITS__MAX_CLIENTS") {
            if let Ok(n) = v.parse() {
                self.limits.max_clients = n;
            }
        }
        if let Ok(v) = std::env::var("DEPOT_LIMITS__ACK_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.limits.ack_timeout_secs = n;
            }
        }
    }
}
