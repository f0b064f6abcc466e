//! PointSync Configuration Module
//! Handles loading and validating pointsync.config.json

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config filename inside the project directory
pub const CONFIG_FILE: &str = "pointsync.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Canonical document path, relative to the project directory
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Backup snapshot directory, relative to the project directory
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    /// Frontend assets served at non-API paths
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Named API keys; any value is accepted as a bearer token
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Reject requests that carry no Authorization header
    #[serde(default)]
    pub require_auth: bool,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_data_file() -> PathBuf {
    PathBuf::from("./data/points-data.json")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("./data/backups")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            backup_dir: default_backup_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load the project config, falling back to defaults when no file exists.
    /// A present-but-broken config is still an error.
    pub fn load_or_default(project_dir: &Path) -> Result<Self, ConfigError> {
        match Self::load(project_dir) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, project_dir: &Path) -> Result<(), ConfigError> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}
