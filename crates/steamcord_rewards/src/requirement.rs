//! Requirement vocabulary and the eligibility check for a single requirement.

use crate::account::AccountRecord;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single condition a player must meet to receive a reward.
///
/// Configured as the PascalCase variant name, e.g. `"DiscordGuildBooster"`.
/// Unknown names are rejected when the configuration is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Requirement {
    /// At least one Discord account is linked
    Discord,
    /// A linked Discord account is in the configured guild
    DiscordGuildMember,
    /// A linked Discord account boosts the configured guild
    DiscordGuildBooster,
    /// At least one Steam account is linked
    Steam,
    /// The player's own Steam account is in the configured Steam group
    SteamGroupMember,
}

impl Requirement {
    pub const ALL: [Requirement; 5] = [
        Requirement::Discord,
        Requirement::DiscordGuildMember,
        Requirement::DiscordGuildBooster,
        Requirement::Steam,
        Requirement::SteamGroupMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::Discord => "Discord",
            Requirement::DiscordGuildMember => "DiscordGuildMember",
            Requirement::DiscordGuildBooster => "DiscordGuildBooster",
            Requirement::Steam => "Steam",
            Requirement::SteamGroupMember => "SteamGroupMember",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Requirement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::ALL
            .into_iter()
            .find(|requirement| requirement.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownRequirement(s.to_string()))
    }
}

impl TryFrom<String> for Requirement {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Requirement> for String {
    fn from(requirement: Requirement) -> Self {
        requirement.as_str().to_string()
    }
}

/// Checks one requirement against a linked account record.
///
/// `steam_id` is the local player's Steam id. Steam group membership only
/// counts for that exact account, never for another Steam account the same
/// Steamcord player happens to have linked.
pub fn is_eligible(record: &AccountRecord, requirement: Requirement, steam_id: &str) -> bool {
    match requirement {
        Requirement::Discord => !record.discord_accounts.is_empty(),
        Requirement::Steam => !record.steam_accounts.is_empty(),
        Requirement::DiscordGuildMember => record
            .discord_accounts
            .iter()
            .any(|account| account.is_guild_member),
        Requirement::DiscordGuildBooster => record
            .discord_accounts
            .iter()
            .any(|account| account.is_guild_booster),
        Requirement::SteamGroupMember => record
            .steam_accounts
            .iter()
            .any(|account| account.steam_id == steam_id && account.is_steam_group_member),
    }
}

/// Logical AND of [`is_eligible`] over every requirement.
pub fn is_eligible_for_all(record: &AccountRecord, requirements: &[Requirement], steam_id: &str) -> bool {
    requirements
        .iter()
        .all(|requirement| is_eligible(record, *requirement, steam_id))
}
