//! # Steamcord Rewards
//!
//! Decides which local permission groups a player belongs to, based on the
//! identities they have linked through Steamcord, and applies queued group
//! commands pushed by the Steamcord service.
//!
//! The crate has no I/O of its own. Everything that touches the outside world
//! is reached through the collaborator traits in [`services`]:
//!
//! * [`PermissionService`] - adds and removes identities from named groups
//! * [`NotificationService`] - tells a player how their claim went
//!
//! ## Flow
//!
//! 1. A host fetches an [`AccountRecord`] for a player (or learns there is none)
//! 2. [`reconcile`] evaluates every [`RewardRule`] and returns group deltas
//! 3. [`RewardsService`] applies the deltas and messages the player
//!
//! Separately, a batch of [`DeferredAction`]s is handed to the
//! [`DeferredActionProcessor`], which returns the ids to acknowledge.

pub mod account;
pub mod actions;
pub mod error;
pub mod reconcile;
pub mod requirement;
pub mod rules;
pub mod services;

pub use account::{AccountRecord, DiscordAccount, SteamAccount};
pub use actions::{ActionKind, DeferredAction, DeferredActionProcessor, GROUP_NAME_ARGUMENT};
pub use error::{ConfigError, ConfigResult, PermissionError, PermissionResult};
pub use reconcile::{reconcile, GroupAction, GroupDelta, Outcome, Reconciliation, RewardsService};
pub use requirement::{is_eligible, is_eligible_for_all, Requirement};
pub use rules::{RewardRule, RewardRuleSet};
pub use services::{Message, NotificationService, PermissionService};
