//! botrunner serve: run the web shell in the foreground
//!
//! The server shares one bot manager with every request. On Ctrl-C the
//! server stops accepting requests and any running bot is stopped.

use anyhow::Result;
use botrunner_server::{BotRunnerServer, ServerConfig};
use clap::Args;
use tracing::{info, warn};

use super::{build_manager, shutdown_signal};
use crate::config::{BotRunnerConfig, ConfigLoader};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let server_config = server_config(&config, &args);
    let manager = build_manager(&config)?;

    info!("Starting botrunner server on {}", server_config.addr());
    let server = BotRunnerServer::new(server_config, manager.clone());
    let listener = server.bind().await?;
    server.run_until(listener, shutdown_signal()).await?;

    let status = manager.status();
    if status.running || status.has_token {
        match manager.stop().await {
            Ok(stopped) => info!(graceful = stopped.graceful, "Bot stopped on shutdown"),
            Err(e) => warn!("Failed to stop bot on shutdown: {}", e),
        }
    }
    Ok(())
}

/// CLI flags take precedence over the config file
fn server_config(config: &BotRunnerConfig, args: &ServeArgs) -> ServerConfig {
    ServerConfig::new(
        args.host.clone().unwrap_or_else(|| config.server.host.clone()),
        args.port.unwrap_or(config.server.port),
    )
}
