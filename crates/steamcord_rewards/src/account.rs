//! Linked account snapshots returned by the Steamcord service.
//!
//! An [`AccountRecord`] is a point-in-time view of one Steamcord player. It is
//! produced by a single fetch and dropped at the end of the pass that used it.

use serde::{Deserialize, Serialize};

/// A Discord identity linked to a Steamcord player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordAccount {
    pub discord_id: String,
    #[serde(default)]
    pub is_guild_member: bool,
    #[serde(default)]
    pub is_guild_booster: bool,
}

/// A Steam identity linked to a Steamcord player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamAccount {
    pub steam_id: String,
    #[serde(default)]
    pub is_steam_group_member: bool,
}

/// Every identity a Steamcord player has linked.
///
/// Both account lists may be empty; a missing list on the wire is read as
/// empty rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub player_id: i64,
    #[serde(default)]
    pub discord_accounts: Vec<DiscordAccount>,
    #[serde(default)]
    pub steam_accounts: Vec<SteamAccount>,
}

impl AccountRecord {
    /// Creates a record with no linked accounts.
    pub fn new(player_id: i64) -> Self {
        Self {
            player_id,
            discord_accounts: Vec::new(),
            steam_accounts: Vec::new(),
        }
    }

    pub fn with_discord(mut self, account: DiscordAccount) -> Self {
        self.discord_accounts.push(account);
        self
    }

    pub fn with_steam(mut self, account: SteamAccount) -> Self {
        self.steam_accounts.push(account);
        self
    }

    /// Steam ids of every linked Steam account, in record order.
    pub fn steam_ids(&self) -> impl Iterator<Item = &str> {
        self.steam_accounts.iter().map(|account| account.steam_id.as_str())
    }
}
