//! Reward rules loaded from configuration.

use crate::account::AccountRecord;
use crate::error::{ConfigError, ConfigResult};
use crate::requirement::{is_eligible_for_all, Requirement};
use serde::{Deserialize, Serialize};

/// A permission group and the requirements that must all hold to join it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRule {
    pub requirements: Vec<Requirement>,
    pub group: String,
}

impl RewardRule {
    pub fn new(requirements: impl IntoIterator<Item = Requirement>, group: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into_iter().collect(),
            group: group.into(),
        }
    }

    /// Shorthand for a rule with exactly one requirement.
    pub fn single(requirement: Requirement, group: impl Into<String>) -> Self {
        Self::new([requirement], group)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.group.trim().is_empty() {
            return Err(ConfigError::EmptyGroupName);
        }
        if self.requirements.is_empty() {
            return Err(ConfigError::EmptyRequirements {
                group: self.group.clone(),
            });
        }
        Ok(())
    }

    pub fn is_satisfied_by(&self, record: &AccountRecord, steam_id: &str) -> bool {
        is_eligible_for_all(record, &self.requirements, steam_id)
    }
}

/// An ordered, validated list of reward rules.
///
/// Constructing or deserializing a rule set validates every rule, so a
/// `RewardRuleSet` that exists is always safe to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RewardRule>", into = "Vec<RewardRule>")]
pub struct RewardRuleSet {
    rules: Vec<RewardRule>,
}

impl RewardRuleSet {
    pub fn new(rules: Vec<RewardRule>) -> ConfigResult<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    /// The rules shipped in a freshly written configuration file.
    pub fn defaults() -> Self {
        Self {
            rules: vec![
                RewardRule::new(
                    [Requirement::DiscordGuildMember, Requirement::SteamGroupMember],
                    "discord-steam-member",
                ),
                RewardRule::single(Requirement::DiscordGuildBooster, "discord-booster"),
            ],
        }
    }

    pub fn rules(&self) -> &[RewardRule] {
        &self.rules
    }

    /// Group names in rule order. A group used by several rules appears once.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if !groups.contains(&rule.group.as_str()) {
                groups.push(rule.group.as_str());
            }
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TryFrom<Vec<RewardRule>> for RewardRuleSet {
    type Error = ConfigError;

    fn try_from(rules: Vec<RewardRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<RewardRuleSet> for Vec<RewardRule> {
    fn from(set: RewardRuleSet) -> Self {
        set.rules
    }
}
