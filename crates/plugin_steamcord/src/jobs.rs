//! Periodic Steamcord jobs: Steam group refresh and the deferred action queue.
//!
//! Each job runs one cycle at a time. A cycle that hangs delays the next
//! tick instead of piling up requests.

use std::future::Future;
use std::time::Duration;
use steamcord_api::RemoteAccountService;
use steamcord_rewards::DeferredActionProcessor;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::PluginResult;

/// Source of the players currently on the server.
pub trait PlayerDirectory: Send + Sync {
    fn connected_steam_ids(&self) -> Vec<String>;
}

/// A fixed list of players, for hosts without a live player list.
#[derive(Debug, Clone, Default)]
pub struct StaticPlayers(pub Vec<String>);

impl PlayerDirectory for StaticPlayers {
    fn connected_steam_ids(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Pushes connected players onto the Steam group queue.
///
/// Returns how many ids were enqueued. Does nothing when nobody is connected.
pub async fn refresh_steam_groups(
    api: &dyn RemoteAccountService,
    players: &dyn PlayerDirectory,
) -> PluginResult<usize> {
    let steam_ids = players.connected_steam_ids();
    if steam_ids.is_empty() {
        return Ok(0);
    }

    api.enqueue_steam_ids(&steam_ids).await?;
    Ok(steam_ids.len())
}

/// Fetches, applies and acknowledges one batch of deferred actions.
///
/// Entries the client could not decode are acknowledged with the rest. A failed fetch is returned as an error and nothing is applied. A failed
/// acknowledgment is only logged: the service redelivers those actions and
/// reapplying them is harmless.
pub async fn drain_action_queue(
    api: &dyn RemoteAccountService,
    processor: &DeferredActionProcessor,
) -> PluginResult<usize> {
    let batch = api.fetch_deferred_actions().await?;
    if batch.is_empty() {
        return Ok(0);
    }

    let mut acknowledged = processor.process_batch(batch.actions);
    acknowledged.extend(batch.undecodable);
    if let Err(e) = api.acknowledge_actions(&acknowledged).await {
        warn!(
            "Failed to acknowledge {} deferred action(s), expecting redelivery: {}",
            acknowledged.len(),
            e
        );
    }
    Ok(acknowledged.len())
}

/// Runs `job` every `period`, first after one full period, until `shutdown` flips.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => job().await,
                _ = shutdown.changed() => break,
            }
        }
        debug!("Stopped {} job", name);
    })
}
