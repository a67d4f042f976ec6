//! Steamcord plugin configuration.
//!
//! Every field has a serde default so a partial `[steamcord]` section still
//! loads. [`SteamcordConfig::validate`] enforces the rules that serde alone
//! cannot, most importantly the minimum polling intervals.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use steamcord_api::DEFAULT_BASE_URI;
use steamcord_rewards::RewardRuleSet;

use crate::lang::LangTable;

/// Lowest allowed Steam group refresh interval. The Steam group queue is
/// rate limited aggressively upstream.
pub const MIN_STEAM_GROUP_INTERVAL_SECS: u64 = 15 * 60;

/// Lowest allowed action queue polling interval.
pub const MIN_ACTION_QUEUE_INTERVAL_SECS: u64 = 60;

fn default_chat_commands() -> Vec<String> {
    vec!["claim".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_steam_group_interval() -> u64 {
    MIN_STEAM_GROUP_INTERVAL_SECS
}

fn default_action_queue_interval() -> u64 {
    MIN_ACTION_QUEUE_INTERVAL_SECS
}

fn default_token() -> String {
    "<your api token>".to_string()
}

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Connection settings for the Steamcord API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Bearer token issued by Steamcord
    #[serde(default = "default_token")]
    pub token: String,
    /// API root, e.g. "https://api.steamcord.io"
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            token: default_token(),
            base_uri: default_base_uri(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Plugin configuration, the `[steamcord]` section of the host config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteamcordConfig {
    /// Chat commands that trigger a claim
    #[serde(default = "default_chat_commands")]
    pub chat_commands: Vec<String>,
    #[serde(default = "default_true")]
    pub chat_commands_enabled: bool,
    /// Periodically push connected players onto the Steam group queue
    #[serde(default = "default_true")]
    pub update_steam_groups: bool,
    #[serde(default = "default_steam_group_interval")]
    pub steam_group_interval_secs: u64,
    /// Periodically apply queued group commands
    #[serde(default = "default_true")]
    pub action_queue_enabled: bool,
    #[serde(default = "default_action_queue_interval")]
    pub action_queue_interval_secs: u64,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub messages: LangTable,
    /// Reward rules, evaluated in order
    #[serde(default = "RewardRuleSet::defaults")]
    pub rewards: RewardRuleSet,
}

impl Default for SteamcordConfig {
    fn default() -> Self {
        Self {
            chat_commands: default_chat_commands(),
            chat_commands_enabled: true,
            update_steam_groups: true,
            steam_group_interval_secs: MIN_STEAM_GROUP_INTERVAL_SECS,
            action_queue_enabled: true,
            action_queue_interval_secs: MIN_ACTION_QUEUE_INTERVAL_SECS,
            api: ApiSettings::default(),
            messages: LangTable::default(),
            rewards: RewardRuleSet::defaults(),
        }
    }
}

impl SteamcordConfig {
    pub fn steam_group_interval(&self) -> Duration {
        Duration::from_secs(self.steam_group_interval_secs)
    }

    pub fn action_queue_interval(&self) -> Duration {
        Duration::from_secs(self.action_queue_interval_secs)
    }

    /// Validates settings that serde cannot check on its own.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is usable, or a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        let base_uri = self.api.base_uri.trim();
        if base_uri.is_empty() {
            return Err("API base URI cannot be empty".to_string());
        }
        if !base_uri.starts_with("http://") && !base_uri.starts_with("https://") {
            return Err(format!("API base URI must be http(s): {base_uri}"));
        }
        if self.api.timeout_secs == 0 {
            return Err("API timeout must be greater than zero".to_string());
        }

        if self.steam_group_interval_secs < MIN_STEAM_GROUP_INTERVAL_SECS {
            return Err(format!(
                "steam_group_interval_secs must be at least {MIN_STEAM_GROUP_INTERVAL_SECS}"
            ));
        }
        if self.action_queue_interval_secs < MIN_ACTION_QUEUE_INTERVAL_SECS {
            return Err(format!(
                "action_queue_interval_secs must be at least {MIN_ACTION_QUEUE_INTERVAL_SECS}"
            ));
        }

        if self.chat_commands_enabled && self.chat_commands.iter().all(|c| c.trim().is_empty()) {
            return Err("Chat commands are enabled but none are configured".to_string());
        }

        // Rule sets built in code bypass deserialization, so check them again
        RewardRuleSet::new(self.rewards.rules().to_vec()).map_err(|e| e.to_string())?;

        Ok(())
    }
}
