//! Deferred group commands queued by the Steamcord service.
//!
//! The service owns redelivery. Locally an action goes Fetched -> Applied ->
//! Acknowledged and is never retried: every action handed to
//! [`DeferredActionProcessor::process_batch`] is acknowledged, whether it
//! was understood, applied cleanly or partially failed.

use crate::account::AccountRecord;
use crate::services::PermissionService;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Argument holding the target group of `addGroup`/`removeGroup`.
pub const GROUP_NAME_ARGUMENT: &str = "groupName";

/// The commands this integration knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    AddGroup,
    RemoveGroup,
}

impl ActionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "addGroup" => Some(ActionKind::AddGroup),
            "removeGroup" => Some(ActionKind::RemoveGroup),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::AddGroup => "addGroup",
            ActionKind::RemoveGroup => "removeGroup",
        }
    }
}

/// A queued command as delivered by the action queue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredAction {
    pub id: i64,
    #[serde(rename = "name")]
    pub definition_name: String,
    #[serde(rename = "player")]
    pub target_account: AccountRecord,
    #[serde(default, deserialize_with = "lenient_arguments")]
    pub arguments: HashMap<String, String>,
    #[serde(rename = "createdDate", deserialize_with = "service_timestamp")]
    pub created: DateTime<Utc>,
}

/// Timestamp layout used by the Steamcord API for naive UTC dates.
const SERVICE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parses RFC 3339, falling back to the service's `2021-10-31 17:34:46.896816` form.
pub fn parse_service_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SERVICE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn service_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_service_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp \"{raw}\"")))
}

/// Keeps string arguments as is, renders other values as JSON and drops nulls.
fn lenient_arguments<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

impl DeferredAction {
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::from_name(&self.definition_name)
    }

    pub fn group_name(&self) -> Option<&str> {
        self.arguments
            .get(GROUP_NAME_ARGUMENT)
            .map(String::as_str)
            .filter(|group| !group.trim().is_empty())
    }
}

/// Applies batches of deferred actions through a [`PermissionService`].
pub struct DeferredActionProcessor {
    permissions: Arc<dyn PermissionService>,
}

impl DeferredActionProcessor {
    pub fn new(permissions: Arc<dyn PermissionService>) -> Self {
        Self { permissions }
    }

    /// Applies `actions` oldest first and returns the ids to acknowledge.
    ///
    /// Ordering by creation time makes the newest command for a given
    /// account and group decide the final membership. Ties keep arrival order.
    pub fn process_batch(&self, mut actions: Vec<DeferredAction>) -> BTreeSet<i64> {
        actions.sort_by_key(|action| action.created);

        let mut acknowledged = BTreeSet::new();
        let mut failures = 0usize;
        for action in &actions {
            failures += self.apply(action);
            acknowledged.insert(action.id);
        }

        if !actions.is_empty() {
            info!(
                "📬 Processed {} deferred action(s), {} permission failure(s)",
                actions.len(),
                failures
            );
        }
        acknowledged
    }

    /// Returns the number of failed permission calls.
    fn apply(&self, action: &DeferredAction) -> usize {
        let Some(kind) = action.kind() else {
            warn!(
                "Skipping deferred action {} with unknown command \"{}\"",
                action.id, action.definition_name
            );
            return 0;
        };
        let Some(group) = action.group_name() else {
            warn!(
                "Skipping deferred action {} ({}): missing \"{}\" argument",
                action.id,
                kind.name(),
                GROUP_NAME_ARGUMENT
            );
            return 0;
        };

        let mut failures = 0;
        for steam_id in action.target_account.steam_ids() {
            let result = match kind {
                ActionKind::AddGroup => self.permissions.add_to_group(steam_id, group),
                ActionKind::RemoveGroup => self.permissions.remove_from_group(steam_id, group),
            };
            match result {
                Ok(()) => debug!("Action {}: {} {} on \"{}\"", action.id, kind.name(), steam_id, group),
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Action {}: {} failed for {} on \"{}\": {}",
                        action.id,
                        kind.name(),
                        steam_id,
                        group,
                        e
                    );
                }
            }
        }
        failures
    }
}
