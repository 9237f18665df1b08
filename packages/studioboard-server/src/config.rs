/// Server configuration.
/// Reads server.json from ~/.config/studioboard/ (or platform equivalent),
/// or from the path in $STUDIOBOARD_CONFIG.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use studioboard_core::config::StoreConfig;

pub const CONFIG_ENV: &str = "STUDIOBOARD_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// SQLite file; defaults to board.db next to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Board to create (or realign) with the default columns at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_board: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    StoreConfig::default().busy_timeout_ms
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            database: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            seed_board: None,
        }
    }
}

impl ServerConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| config_dir().join("board.db"))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

/// ~/.config/studioboard
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studioboard")
}

pub fn default_config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("server.json"),
    }
}

/// Load config from path. Returns defaults if the file is missing or broken.
pub fn load_config(path: &Path) -> ServerConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            ServerConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            ServerConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}
