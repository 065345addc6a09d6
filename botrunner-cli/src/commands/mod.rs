pub mod config;
pub mod run;
pub mod serve;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use botrunner_commands::CommandTable;
use botrunner_core::{BotManager, DiscordConnector};

use crate::config::BotRunnerConfig;

/// Build the bot manager described by the merged config
pub fn build_manager(config: &BotRunnerConfig) -> Result<Arc<BotManager>> {
    anyhow::ensure!(!config.bot.prefix.is_empty(), "bot.prefix must not be empty");
    let commands = CommandTable::with_builtins(&config.bot.prefix)
        .context("Failed to build command table")?;
    let connector = DiscordConnector::new(config.discord.connector_config());
    Ok(Arc::new(BotManager::with_config(
        Arc::new(connector),
        Arc::new(commands),
        config.bot.manager_config(),
    )))
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
