//! Collaborator traits the reward engine is wired to.
//!
//! Hosts implement these against their own permission system and chat layer;
//! tests substitute recording fakes.

use crate::error::PermissionResult;
use crate::reconcile::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Group membership backend.
///
/// Add and remove must be idempotent: adding a member twice or removing a
/// non-member is not an error.
pub trait PermissionService: Send + Sync {
    /// Creates `group` if it does not exist. Returns `true` when it was created.
    fn create_group(&self, group: &str) -> PermissionResult<bool>;

    fn add_to_group(&self, identity: &str, group: &str) -> PermissionResult<()>;

    fn remove_from_group(&self, identity: &str, group: &str) -> PermissionResult<()>;
}

/// Player-facing messages, keyed the same way as the lang table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    Error,
    ClaimNoRewards,
    ClaimRewards,
}

impl Message {
    pub const ALL: [Message; 3] = [Message::Error, Message::ClaimNoRewards, Message::ClaimRewards];

    pub fn key(&self) -> &'static str {
        match self {
            Message::Error => "Error",
            Message::ClaimNoRewards => "ClaimNoRewards",
            Message::ClaimRewards => "ClaimRewards",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<Outcome> for Message {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Rewarded => Message::ClaimRewards,
            Outcome::NotRewarded | Outcome::NoAccount => Message::ClaimNoRewards,
        }
    }
}

/// Delivers a message to a player. Not part of reward correctness.
pub trait NotificationService: Send + Sync {
    fn message(&self, player_id: &str, message: Message);
}
