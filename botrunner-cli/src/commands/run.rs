//! botrunner run: headless bot without the web shell

use anyhow::{Context, Result};
use botrunner_core::{BotManager, LifecycleEvent};
use clap::Args;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{build_manager, shutdown_signal};
use crate::config::ConfigLoader;

/// Environment variable read when `--token` is not given
pub const TOKEN_ENV: &str = "BOTRUNNER_TOKEN";

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Bot token (prefer the environment variable; flags show up in `ps`)
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: String,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let manager = build_manager(&config)?;
    let events = manager.subscribe();

    let started = manager.start(&args.token).await.context("Failed to start bot")?;
    info!(session_id = %started.session_id, "Bot running, press Ctrl-C to stop");

    tokio::select! {
        _ = shutdown_signal() => info!("Shutting down"),
        reason = wait_for_disconnect(events) => warn!("Bot stopped running: {}", reason),
    }

    stop(&manager).await
}

/// Log lifecycle events until the session ends on its own
async fn wait_for_disconnect(mut events: broadcast::Receiver<LifecycleEvent>) -> String {
    loop {
        match events.recv().await {
            Ok(LifecycleEvent::Connected { name, guilds }) => {
                info!(guilds, "Logged in as {}", name);
            }
            Ok(LifecycleEvent::Disconnected { reason }) => return reason,
            Ok(event) => tracing::debug!(?event, "Lifecycle event"),
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!("Missed {} lifecycle events", count);
            }
            Err(broadcast::error::RecvError::Closed) => return "manager dropped".to_string(),
        }
    }
}

async fn stop(manager: &BotManager) -> Result<()> {
    let stopped = manager.stop().await.context("Failed to stop bot")?;
    if !stopped.graceful {
        warn!("Bot did not shut down in time and was abandoned");
    }
    Ok(())
}
