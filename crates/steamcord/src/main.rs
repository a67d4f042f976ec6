//! Steamcord host
//!
//! Runs the Steamcord rewards plugin as a standalone process: loads the TOML
//! configuration, keeps group membership in a JSON snapshot, and either runs
//! one claim (`--claim`) or keeps the periodic jobs going until a shutdown
//! signal arrives.

use anyhow::{bail, Result};
use plugin_steamcord::{GroupStore, StaticPlayers, SteamcordPlugin, TracingChatSink};
use std::sync::Arc;
use tracing::{error, info};

mod cli;
mod config;
mod logging;
mod signals;

use cli::CliArgs;
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path).await?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    logging::setup_logging(&config.logging, args.json_logs)?;

    if let Err(e) = config.validate() {
        error!("❌ Configuration validation failed: {}", e);
        bail!("invalid configuration in {}: {e}", args.config_path.display());
    }

    let store_path = config.host.group_store_path();
    let store = Arc::new(GroupStore::load(&store_path).await?);
    let players = Arc::new(StaticPlayers(config.host.tracked_steam_ids.clone()));

    let mut plugin = SteamcordPlugin::from_config(
        config.steamcord.clone(),
        store.clone(),
        Arc::new(TracingChatSink),
        players,
    )?;
    plugin.init()?;

    if let Some(steam_id) = args.claim.as_deref() {
        let result = plugin.claim(steam_id).await;
        store.save(&store_path).await?;
        let reconciliation = result?;
        println!("{:?}", reconciliation.outcome);
        for delta in reconciliation.effective_deltas() {
            println!("  {:?} {}", delta.action, delta.group);
        }
        return Ok(());
    }

    plugin.on_server_initialized();
    info!("🚀 Steamcord host running with config {}", args.config_path.display());

    signals::wait_for_shutdown().await?;

    info!("🛑 Shutting down...");
    plugin.shutdown().await;
    store.save(&store_path).await?;
    info!("✅ Group snapshot saved to {}", store_path.display());
    Ok(())
}
