//! Steamcord - Account Link Rewards Plugin
//!
//! Grants permission groups to players based on the Discord and Steam
//! accounts they have linked through Steamcord:
//! - `claim` chat command that re-evaluates a player's rewards on demand
//! - Periodic Steam group refresh for connected players
//! - Periodic processing of group commands queued by the Steamcord service
//!
//! The plugin owns no permission state. Groups are changed through the
//! injected [`PermissionService`], players are messaged through the injected
//! [`NotificationService`], and the Steamcord API is reached through
//! [`RemoteAccountService`], so every piece can be swapped in tests.

use std::sync::Arc;
use steamcord_api::{RemoteAccountService, SteamcordApiClient};
use steamcord_rewards::{
    DeferredActionProcessor, Message, NotificationService, PermissionService, Reconciliation,
    RewardsService,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub mod config;
pub mod error;
pub mod groups;
pub mod jobs;
pub mod lang;

#[cfg(test)]
mod test_support;

pub use config::{ApiSettings, SteamcordConfig};
pub use error::{PluginError, PluginResult};
pub use groups::GroupStore;
pub use jobs::{PlayerDirectory, StaticPlayers};
pub use lang::{ChatSink, LangNotifier, LangTable, TracingChatSink};

// ============================================================================
// Plugin
// ============================================================================

pub struct SteamcordPlugin {
    name: String,
    version: String,
    config: SteamcordConfig,
    api: Arc<dyn RemoteAccountService>,
    permissions: Arc<dyn PermissionService>,
    notifications: Arc<dyn NotificationService>,
    players: Arc<dyn PlayerDirectory>,
    rewards: Arc<RewardsService>,
    processor: Arc<DeferredActionProcessor>,
    shutdown: watch::Sender<bool>,
    jobs: Vec<JoinHandle<()>>,
}

impl SteamcordPlugin {
    /// Creates the plugin from explicit collaborators.
    ///
    /// Fails when the configuration is invalid; no rules are applied from a
    /// configuration that did not validate.
    pub fn new(
        config: SteamcordConfig,
        api: Arc<dyn RemoteAccountService>,
        permissions: Arc<dyn PermissionService>,
        notifications: Arc<dyn NotificationService>,
        players: Arc<dyn PlayerDirectory>,
    ) -> PluginResult<Self> {
        config.validate().map_err(PluginError::InitializationFailed)?;

        let rewards = Arc::new(RewardsService::new(
            permissions.clone(),
            notifications.clone(),
            config.rewards.clone(),
        ));
        let processor = Arc::new(DeferredActionProcessor::new(permissions.clone()));
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            name: "steamcord".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            api,
            permissions,
            notifications,
            players,
            rewards,
            processor,
            shutdown,
            jobs: Vec::new(),
        })
    }

    /// Creates the plugin talking to the real Steamcord API, with messages
    /// rendered from the configured lang table into `chat`.
    pub fn from_config(
        config: SteamcordConfig,
        permissions: Arc<dyn PermissionService>,
        chat: Arc<dyn ChatSink>,
        players: Arc<dyn PlayerDirectory>,
    ) -> PluginResult<Self> {
        let api = SteamcordApiClient::new(&config.api.token, &config.api.base_uri, config.api.timeout())?;
        let notifications = Arc::new(LangNotifier::new(config.messages.clone(), chat));
        Self::new(config, Arc::new(api), permissions, notifications, players)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &SteamcordConfig {
        &self.config
    }

    /// Creates every reward group. Returns how many did not exist yet.
    pub fn init(&self) -> PluginResult<usize> {
        info!("🔗 {} v{}: initializing", self.name, self.version);

        let mut created = 0;
        for group in self.config.rewards.groups() {
            if self.permissions.create_group(group)? {
                info!("Created group \"{}\".", group);
                created += 1;
            }
        }

        if self.config.chat_commands_enabled {
            info!("Listening for chat commands: {}", self.config.chat_commands.join(", "));
        }
        Ok(created)
    }

    /// Starts the periodic jobs enabled in the configuration.
    pub fn on_server_initialized(&mut self) {
        if self.config.update_steam_groups {
            let api = self.api.clone();
            let players = self.players.clone();
            self.jobs.push(jobs::spawn_periodic(
                "steam group refresh",
                self.config.steam_group_interval(),
                self.shutdown.subscribe(),
                move || {
                    let api = api.clone();
                    let players = players.clone();
                    async move {
                        match jobs::refresh_steam_groups(api.as_ref(), players.as_ref()).await {
                            Ok(0) => debug!("No connected players, skipping Steam group refresh"),
                            Ok(count) => info!("🔄 Queued {} player(s) for Steam group refresh", count),
                            Err(e) => warn!("Steam group refresh failed: {}", e),
                        }
                    }
                },
            ));
        }

        if self.config.action_queue_enabled {
            let api = self.api.clone();
            let processor = self.processor.clone();
            self.jobs.push(jobs::spawn_periodic(
                "action queue",
                self.config.action_queue_interval(),
                self.shutdown.subscribe(),
                move || {
                    let api = api.clone();
                    let processor = processor.clone();
                    async move {
                        if let Err(e) = jobs::drain_action_queue(api.as_ref(), &processor).await {
                            warn!("Skipping action queue cycle: {}", e);
                        }
                    }
                },
            ));
        }

        info!("✅ {}: {} periodic job(s) running", self.name, self.jobs.len());
    }

    /// Re-evaluates a player's rewards against their linked accounts.
    ///
    /// Fetch, reconcile, apply and notify happen strictly in that order. When
    /// the lookup fails the player gets the error message and their groups
    /// are left exactly as they were.
    pub async fn claim(&self, steam_id: &str) -> PluginResult<Reconciliation> {
        let record = match self.api.fetch_player_by_steam_id(steam_id).await {
            Ok(record) => record,
            Err(e) => {
                error!("Claim for {} failed: {}", steam_id, e);
                self.notifications.message(steam_id, Message::Error);
                return Err(e.into());
            }
        };

        let reconciliation = self.rewards.provision_rewards(steam_id, record.as_ref());
        info!("🎁 Claim for {}: {:?}", steam_id, reconciliation.outcome);
        Ok(reconciliation)
    }

    /// Whether `command` is one of the configured claim commands.
    ///
    /// Matching ignores case and an optional leading `/`.
    pub fn matches_chat_command(&self, command: &str) -> bool {
        if !self.config.chat_commands_enabled {
            return false;
        }
        let command = command.trim().trim_start_matches('/');
        self.config
            .chat_commands
            .iter()
            .any(|configured| configured.trim().eq_ignore_ascii_case(command))
    }

    /// Runs a claim when `command` is a claim command, otherwise returns `None`.
    pub async fn handle_chat_command(&self, steam_id: &str, command: &str) -> Option<PluginResult<Reconciliation>> {
        if !self.matches_chat_command(command) {
            return None;
        }
        Some(self.claim(steam_id).await)
    }

    /// Stops the periodic jobs and waits for them to finish.
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown.send(true);
        for job in self.jobs.drain(..) {
            if let Err(e) = job.await {
                error!("Steamcord job ended abnormally: {}", e);
            }
        }
        info!("👋 {}: shut down", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeApi, PlayerLookup};
    use std::sync::Mutex;
    use steamcord_rewards::{AccountRecord, DiscordAccount, Outcome, SteamAccount};

    const STEAM_ID: &str = "76561198117837537";

    #[derive(Default)]
    struct RecordingNotifications(Mutex<Vec<(String, Message)>>);

    impl NotificationService for RecordingNotifications {
        fn message(&self, player_id: &str, message: Message) {
            self.0.lock().unwrap().push((player_id.to_string(), message));
        }
    }

    struct Harness {
        plugin: SteamcordPlugin,
        api: Arc<FakeApi>,
        store: Arc<GroupStore>,
        notifications: Arc<RecordingNotifications>,
    }

    fn harness(lookup: PlayerLookup) -> Harness {
        let api = Arc::new(FakeApi::new(lookup));
        let store = Arc::new(GroupStore::new());
        let notifications = Arc::new(RecordingNotifications::default());
        let plugin = SteamcordPlugin::new(
            SteamcordConfig::default(),
            api.clone(),
            store.clone(),
            notifications.clone(),
            Arc::new(StaticPlayers(vec![STEAM_ID.to_string()])),
        )
        .unwrap();
        plugin.init().unwrap();
        Harness {
            plugin,
            api,
            store,
            notifications,
        }
    }

    fn linked(member: bool, booster: bool) -> AccountRecord {
        AccountRecord::new(1)
            .with_discord(DiscordAccount {
                discord_id: "304797177538936832".to_string(),
                is_guild_member: member,
                is_guild_booster: booster,
            })
            .with_steam(SteamAccount {
                steam_id: STEAM_ID.to_string(),
                is_steam_group_member: true,
            })
    }

    #[test]
    fn test_init_creates_reward_groups() {
        let h = harness(PlayerLookup::NotLinked);

        assert!(h.store.has_group("discord-steam-member"));
        assert!(h.store.has_group("discord-booster"));
        // Second init finds them already there
        assert_eq!(h.plugin.init().unwrap(), 0);
        assert_eq!(h.plugin.name(), "steamcord");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SteamcordConfig::default();
        config.action_queue_interval_secs = 1;

        let result = SteamcordPlugin::new(
            config,
            Arc::new(FakeApi::new(PlayerLookup::NotLinked)),
            Arc::new(GroupStore::new()),
            Arc::new(RecordingNotifications::default()),
            Arc::new(StaticPlayers::default()),
        );

        assert!(matches!(result, Err(PluginError::InitializationFailed(_))));
    }

    #[tokio::test]
    async fn test_claim_grants_groups() {
        let h = harness(PlayerLookup::Linked(linked(true, false)));

        let result = h.plugin.claim(STEAM_ID).await.unwrap();

        assert_eq!(result.outcome, Outcome::Rewarded);
        assert_eq!(h.store.groups_of(STEAM_ID), vec!["discord-steam-member"]);
        assert_eq!(
            *h.notifications.0.lock().unwrap(),
            vec![(STEAM_ID.to_string(), Message::ClaimRewards)]
        );
        assert_eq!(*h.api.lookups.lock().unwrap(), vec![STEAM_ID.to_string()]);
    }

    #[tokio::test]
    async fn test_claim_after_unlinking_strips_groups() {
        let h = harness(PlayerLookup::Linked(linked(true, true)));
        h.plugin.claim(STEAM_ID).await.unwrap();
        assert_eq!(h.store.groups_of(STEAM_ID).len(), 2);

        *h.api.lookup.lock().unwrap() = PlayerLookup::NotLinked;
        let result = h.plugin.claim(STEAM_ID).await.unwrap();

        assert_eq!(result.outcome, Outcome::NoAccount);
        assert!(h.store.groups_of(STEAM_ID).is_empty());
        assert_eq!(
            h.notifications.0.lock().unwrap().last(),
            Some(&(STEAM_ID.to_string(), Message::ClaimNoRewards))
        );
    }

    #[tokio::test]
    async fn test_failed_lookup_keeps_groups() {
        let h = harness(PlayerLookup::Linked(linked(true, true)));
        h.plugin.claim(STEAM_ID).await.unwrap();

        *h.api.lookup.lock().unwrap() = PlayerLookup::Fails(500);
        let result = h.plugin.claim(STEAM_ID).await;

        assert!(matches!(result, Err(PluginError::Api(_))));
        assert_eq!(h.store.groups_of(STEAM_ID).len(), 2);
        assert_eq!(
            h.notifications.0.lock().unwrap().last(),
            Some(&(STEAM_ID.to_string(), Message::Error))
        );
    }

    #[tokio::test]
    async fn test_chat_command_matching() {
        let h = harness(PlayerLookup::NotLinked);

        assert!(h.plugin.matches_chat_command("claim"));
        assert!(h.plugin.matches_chat_command("/CLAIM"));
        assert!(!h.plugin.matches_chat_command("kit"));

        assert!(h.plugin.handle_chat_command(STEAM_ID, "kit").await.is_none());
        assert!(h.api.lookups.lock().unwrap().is_empty());

        let result = h.plugin.handle_chat_command(STEAM_ID, "/claim").await;
        assert_eq!(result.unwrap().unwrap().outcome, Outcome::NoAccount);
    }

    #[tokio::test]
    async fn test_disabled_chat_commands() {
        let mut config = SteamcordConfig::default();
        config.chat_commands_enabled = false;
        let plugin = SteamcordPlugin::new(
            config,
            Arc::new(FakeApi::new(PlayerLookup::NotLinked)),
            Arc::new(GroupStore::new()),
            Arc::new(RecordingNotifications::default()),
            Arc::new(StaticPlayers::default()),
        )
        .unwrap();

        assert!(!plugin.matches_chat_command("claim"));
        assert!(plugin.handle_chat_command(STEAM_ID, "claim").await.is_none());
    }

    #[tokio::test]
    async fn test_jobs_start_and_stop() {
        let mut h = harness(PlayerLookup::NotLinked);

        h.plugin.on_server_initialized();
        assert_eq!(h.plugin.jobs.len(), 2);

        tokio::time::timeout(std::time::Duration::from_secs(5), h.plugin.shutdown())
            .await
            .expect("shutdown should not hang");
        assert!(h.plugin.jobs.is_empty());
    }
}
