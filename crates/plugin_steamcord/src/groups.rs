//! In-memory permission groups with JSON snapshots.
//!
//! Used by the standalone host and by tests. A game server with its own
//! permission system implements [`PermissionService`] directly instead.

use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use steamcord_rewards::{PermissionError, PermissionResult, PermissionService};
use tracing::{debug, info};

use crate::error::PluginResult;

/// Group name -> member identities.
#[derive(Debug, Default)]
pub struct GroupStore {
    groups: DashMap<String, BTreeSet<String>>,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn is_member(&self, identity: &str, group: &str) -> bool {
        self.groups
            .get(group)
            .map(|members| members.contains(identity))
            .unwrap_or(false)
    }

    /// Members of `group`, sorted. Empty for unknown groups.
    pub fn members(&self, group: &str) -> Vec<String> {
        self.groups
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Groups `identity` belongs to, sorted.
    pub fn groups_of(&self, identity: &str) -> Vec<String> {
        let mut groups: Vec<String> = self
            .groups
            .iter()
            .filter(|entry| entry.value().contains(identity))
            .map(|entry| entry.key().clone())
            .collect();
        groups.sort();
        groups
    }

    pub fn snapshot(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.groups
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Loads a snapshot written by [`GroupStore::save`]. A missing file gives an empty store.
    pub async fn load(path: &Path) -> PluginResult<Self> {
        if !tokio::fs::try_exists(path).await? {
            debug!("No group snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let snapshot: BTreeMap<String, BTreeSet<String>> = serde_json::from_str(&content)?;
        info!("📂 Loaded {} group(s) from {}", snapshot.len(), path.display());
        Ok(Self {
            groups: snapshot.into_iter().collect(),
        })
    }

    pub async fn save(&self, path: &Path) -> PluginResult<()> {
        let content = serde_json::to_string_pretty(&self.snapshot())?;
        tokio::fs::write(path, content).await?;
        debug!("Saved group snapshot to {}", path.display());
        Ok(())
    }
}

impl PermissionService for GroupStore {
    fn create_group(&self, group: &str) -> PermissionResult<bool> {
        if self.groups.contains_key(group) {
            return Ok(false);
        }
        self.groups.insert(group.to_string(), BTreeSet::new());
        Ok(true)
    }

    fn add_to_group(&self, identity: &str, group: &str) -> PermissionResult<()> {
        let mut members = self
            .groups
            .get_mut(group)
            .ok_or_else(|| PermissionError::GroupNotFound(group.to_string()))?;
        members.insert(identity.to_string());
        Ok(())
    }

    fn remove_from_group(&self, identity: &str, group: &str) -> PermissionResult<()> {
        let mut members = self
            .groups
            .get_mut(group)
            .ok_or_else(|| PermissionError::GroupNotFound(group.to_string()))?;
        members.remove(identity);
        Ok(())
    }
}
