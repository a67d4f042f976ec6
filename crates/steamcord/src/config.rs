//! Host configuration management.
//!
//! Loads the TOML configuration file, writing a default one when it does not
//! exist yet, and validates it before anything is started.

use anyhow::{Context, Result};
use plugin_steamcord::SteamcordConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_group_store_path() -> String {
    "groups.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Host process settings
    #[serde(default)]
    pub host: HostSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Steamcord plugin settings
    #[serde(default)]
    pub steamcord: SteamcordConfig,
}

/// Settings for running the plugin outside a game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSettings {
    /// Steam ids treated as connected players for the Steam group refresh
    #[serde(default)]
    pub tracked_steam_ids: Vec<String>,
    /// JSON snapshot of group membership, loaded at start and saved on exit
    #[serde(default = "default_group_store_path")]
    pub group_store_path: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            tracked_steam_ids: Vec::new(),
            group_store_path: default_group_store_path(),
        }
    }
}

impl HostSettings {
    pub fn group_store_path(&self) -> PathBuf {
        PathBuf::from(&self.group_store_path)
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to `path`
    /// and returns it.
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path).await? {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let config: AppConfig =
                toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LOG_LEVELS:?}",
                &self.logging.level
            ));
        }

        if self.host.group_store_path.trim().is_empty() {
            return Err("Group store path cannot be empty".to_string());
        }

        if self.host.tracked_steam_ids.iter().any(|id| id.trim().is_empty()) {
            return Err("Tracked Steam ids cannot be blank".to_string());
        }

        self.steamcord.validate()
    }
}
