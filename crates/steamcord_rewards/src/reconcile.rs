//! Reconciliation of a player's reward groups against their linked accounts.
//!
//! [`reconcile`] is pure: it only computes deltas. [`RewardsService`] is the
//! thin effectful wrapper that applies them and tells the player.

use crate::account::AccountRecord;
use crate::rules::{RewardRule, RewardRuleSet};
use crate::services::{Message, NotificationService, PermissionService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

// ============================================================================
// Deltas
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupAction {
    Add,
    Remove,
}

/// One membership change for the player being reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupDelta {
    pub group: String,
    pub action: GroupAction,
}

impl GroupDelta {
    pub fn add(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            action: GroupAction::Add,
        }
    }

    pub fn remove(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            action: GroupAction::Remove,
        }
    }
}

/// How a claim turned out, as reported to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// At least one reward group was granted
    Rewarded,
    /// Linked, but no rule was satisfied
    NotRewarded,
    /// The service confirmed there is no linked account
    NoAccount,
}

/// Result of reconciling one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// One delta per rule, in rule order
    pub deltas: Vec<GroupDelta>,
    pub outcome: Outcome,
}

impl Reconciliation {
    /// Deltas collapsed to one per group, first-seen order.
    ///
    /// When several rules target the same group, any granting rule wins, so a
    /// later unsatisfied rule cannot take back a group an earlier rule gave.
    pub fn effective_deltas(&self) -> Vec<GroupDelta> {
        let mut effective: Vec<GroupDelta> = Vec::with_capacity(self.deltas.len());
        for delta in &self.deltas {
            match effective.iter_mut().find(|seen| seen.group == delta.group) {
                Some(seen) => {
                    if delta.action == GroupAction::Add {
                        seen.action = GroupAction::Add;
                    }
                }
                None => effective.push(delta.clone()),
            }
        }
        effective
    }
}

/// Computes the group changes for one player.
///
/// `record` must only be `None` when the service confirmed the player has no
/// link. A failed fetch is not a missing record; callers must not reconcile
/// in that case or every player would be stripped during an outage.
pub fn reconcile(steam_id: &str, record: Option<&AccountRecord>, rules: &[RewardRule]) -> Reconciliation {
    let Some(record) = record else {
        return Reconciliation {
            deltas: rules.iter().map(|rule| GroupDelta::remove(&rule.group)).collect(),
            outcome: Outcome::NoAccount,
        };
    };

    let mut rewarded = false;
    let deltas: Vec<GroupDelta> = rules
        .iter()
        .map(|rule| {
            if rule.is_satisfied_by(record, steam_id) {
                rewarded = true;
                GroupDelta::add(&rule.group)
            } else {
                GroupDelta::remove(&rule.group)
            }
        })
        .collect();

    Reconciliation {
        deltas,
        outcome: if rewarded {
            Outcome::Rewarded
        } else {
            Outcome::NotRewarded
        },
    }
}

// ============================================================================
// Rewards Service
// ============================================================================

/// Applies reconciliation results through the injected collaborators.
pub struct RewardsService {
    permissions: Arc<dyn PermissionService>,
    notifications: Arc<dyn NotificationService>,
    rules: RewardRuleSet,
}

impl RewardsService {
    pub fn new(
        permissions: Arc<dyn PermissionService>,
        notifications: Arc<dyn NotificationService>,
        rules: RewardRuleSet,
    ) -> Self {
        Self {
            permissions,
            notifications,
            rules,
        }
    }

    pub fn rules(&self) -> &RewardRuleSet {
        &self.rules
    }

    /// Reconciles `steam_id` against `record`, applies the changes and
    /// messages the player.
    ///
    /// A failing add or remove is logged and the remaining deltas still run.
    pub fn provision_rewards(&self, steam_id: &str, record: Option<&AccountRecord>) -> Reconciliation {
        let reconciliation = reconcile(steam_id, record, self.rules.rules());

        for delta in reconciliation.effective_deltas() {
            let result = match delta.action {
                GroupAction::Add => self.permissions.add_to_group(steam_id, &delta.group),
                GroupAction::Remove => self.permissions.remove_from_group(steam_id, &delta.group),
            };
            match result {
                Ok(()) => debug!("{:?} {} -> group \"{}\"", delta.action, steam_id, delta.group),
                Err(e) => warn!(
                    "Failed to apply {:?} for {} on group \"{}\": {}",
                    delta.action, steam_id, delta.group, e
                ),
            }
        }

        self.notifications
            .message(steam_id, Message::from(reconciliation.outcome));
        reconciliation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{DiscordAccount, SteamAccount};
    use crate::error::{PermissionError, PermissionResult};
    use crate::requirement::Requirement;
    use std::sync::Mutex;

    const STEAM_ID: &str = "1";
    const MEMBER_GROUP: &str = "discord-steam-member";
    const BOOSTER_GROUP: &str = "discord-booster";

    #[derive(Default)]
    struct RecordingPermissions {
        calls: Mutex<Vec<(GroupAction, String, String)>>,
        failing_group: Option<String>,
    }

    impl RecordingPermissions {
        fn calls(&self) -> Vec<(GroupAction, String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, action: GroupAction, identity: &str, group: &str) -> PermissionResult<()> {
            if self.failing_group.as_deref() == Some(group) {
                return Err(PermissionError::Backend("offline".to_string()));
            }
            self.calls
                .lock()
                .unwrap()
                .push((action, identity.to_string(), group.to_string()));
            Ok(())
        }
    }

    impl PermissionService for RecordingPermissions {
        fn create_group(&self, _group: &str) -> PermissionResult<bool> {
            Ok(true)
        }

        fn add_to_group(&self, identity: &str, group: &str) -> PermissionResult<()> {
            self.record(GroupAction::Add, identity, group)
        }

        fn remove_from_group(&self, identity: &str, group: &str) -> PermissionResult<()> {
            self.record(GroupAction::Remove, identity, group)
        }
    }

    #[derive(Default)]
    struct RecordingNotifications {
        messages: Mutex<Vec<(String, Message)>>,
    }

    impl NotificationService for RecordingNotifications {
        fn message(&self, player_id: &str, message: Message) {
            self.messages.lock().unwrap().push((player_id.to_string(), message));
        }
    }

    fn rules() -> RewardRuleSet {
        RewardRuleSet::new(vec![
            RewardRule::new(
                [Requirement::DiscordGuildMember, Requirement::SteamGroupMember],
                MEMBER_GROUP,
            ),
            RewardRule::single(Requirement::DiscordGuildBooster, BOOSTER_GROUP),
        ])
        .unwrap()
    }

    fn record(member: bool, booster: bool, steam_group_member: bool) -> AccountRecord {
        AccountRecord::new(1)
            .with_discord(DiscordAccount {
                discord_id: "1".to_string(),
                is_guild_member: member,
                is_guild_booster: booster,
            })
            .with_steam(SteamAccount {
                steam_id: STEAM_ID.to_string(),
                is_steam_group_member: steam_group_member,
            })
    }

    #[test]
    fn test_eligible_for_one_reward() {
        let result = reconcile(STEAM_ID, Some(&record(true, false, true)), rules().rules());

        assert_eq!(
            result.deltas,
            vec![GroupDelta::add(MEMBER_GROUP), GroupDelta::remove(BOOSTER_GROUP)]
        );
        assert_eq!(result.outcome, Outcome::Rewarded);
    }

    #[test]
    fn test_eligible_for_all_rewards() {
        let result = reconcile(STEAM_ID, Some(&record(true, true, true)), rules().rules());

        assert_eq!(
            result.deltas,
            vec![GroupDelta::add(MEMBER_GROUP), GroupDelta::add(BOOSTER_GROUP)]
        );
        assert_eq!(result.outcome, Outcome::Rewarded);
    }

    #[test]
    fn test_linked_without_flags_is_not_rewarded() {
        let result = reconcile(STEAM_ID, Some(&record(false, false, false)), rules().rules());

        assert_eq!(
            result.deltas,
            vec![GroupDelta::remove(MEMBER_GROUP), GroupDelta::remove(BOOSTER_GROUP)]
        );
        assert_eq!(result.outcome, Outcome::NotRewarded);
    }

    #[test]
    fn test_no_account_strips_every_group() {
        let result = reconcile(STEAM_ID, None, rules().rules());

        assert_eq!(
            result.deltas,
            vec![GroupDelta::remove(MEMBER_GROUP), GroupDelta::remove(BOOSTER_GROUP)]
        );
        assert_eq!(result.outcome, Outcome::NoAccount);
    }

    #[test]
    fn test_no_account_without_rules() {
        let result = reconcile(STEAM_ID, None, &[]);

        assert!(result.deltas.is_empty());
        assert_eq!(result.outcome, Outcome::NoAccount);
    }

    #[test]
    fn test_linked_without_rules_is_not_rewarded() {
        let result = reconcile(STEAM_ID, Some(&record(true, true, true)), &[]);

        assert!(result.deltas.is_empty());
        assert_eq!(result.outcome, Outcome::NotRewarded);
    }

    #[test]
    fn test_group_membership_of_another_steam_account_does_not_count() {
        let mut other = record(true, false, false);
        other.steam_accounts.push(SteamAccount {
            steam_id: "2".to_string(),
            is_steam_group_member: true,
        });

        let result = reconcile(STEAM_ID, Some(&other), rules().rules());

        assert_eq!(result.deltas[0], GroupDelta::remove(MEMBER_GROUP));
        assert_eq!(result.outcome, Outcome::NotRewarded);
    }

    #[test]
    fn test_effective_deltas_prefer_grants() {
        let rules = vec![
            RewardRule::single(Requirement::DiscordGuildBooster, "vip"),
            RewardRule::single(Requirement::SteamGroupMember, "vip"),
            RewardRule::single(Requirement::Discord, "linked"),
        ];

        let result = reconcile(STEAM_ID, Some(&record(false, true, false)), &rules);

        assert_eq!(result.deltas.len(), 3);
        assert_eq!(
            result.effective_deltas(),
            vec![GroupDelta::add("vip"), GroupDelta::add("linked")]
        );
    }

    #[test]
    fn test_provision_applies_and_messages() {
        let permissions = Arc::new(RecordingPermissions::default());
        let notifications = Arc::new(RecordingNotifications::default());
        let service = RewardsService::new(permissions.clone(), notifications.clone(), rules());

        let result = service.provision_rewards(STEAM_ID, Some(&record(true, false, true)));

        assert_eq!(result.outcome, Outcome::Rewarded);
        assert_eq!(
            permissions.calls(),
            vec![
                (GroupAction::Add, STEAM_ID.to_string(), MEMBER_GROUP.to_string()),
                (GroupAction::Remove, STEAM_ID.to_string(), BOOSTER_GROUP.to_string()),
            ]
        );
        assert_eq!(
            *notifications.messages.lock().unwrap(),
            vec![(STEAM_ID.to_string(), Message::ClaimRewards)]
        );
    }

    #[test]
    fn test_provision_without_account_messages_no_rewards() {
        let permissions = Arc::new(RecordingPermissions::default());
        let notifications = Arc::new(RecordingNotifications::default());
        let service = RewardsService::new(permissions.clone(), notifications.clone(), rules());

        service.provision_rewards(STEAM_ID, None);

        assert_eq!(permissions.calls().len(), 2);
        assert!(permissions
            .calls()
            .iter()
            .all(|(action, _, _)| *action == GroupAction::Remove));
        assert_eq!(
            *notifications.messages.lock().unwrap(),
            vec![(STEAM_ID.to_string(), Message::ClaimNoRewards)]
        );
    }

    #[test]
    fn test_provision_continues_after_permission_failure() {
        let permissions = Arc::new(RecordingPermissions {
            failing_group: Some(MEMBER_GROUP.to_string()),
            ..Default::default()
        });
        let notifications = Arc::new(RecordingNotifications::default());
        let service = RewardsService::new(permissions.clone(), notifications.clone(), rules());

        let result = service.provision_rewards(STEAM_ID, Some(&record(true, true, true)));

        assert_eq!(result.outcome, Outcome::Rewarded);
        assert_eq!(
            permissions.calls(),
            vec![(GroupAction::Add, STEAM_ID.to_string(), BOOSTER_GROUP.to_string())]
        );
        assert_eq!(notifications.messages.lock().unwrap().len(), 1);
    }
}
