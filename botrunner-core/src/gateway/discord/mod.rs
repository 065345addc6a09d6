//! Discord implementation of the gateway traits

pub mod cache;
pub mod connection;
pub mod protocol;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use connection::DiscordConnection;
pub use rest::RestClient;

use self::connection::GatewayTask;
use crate::error::GatewayError;
use crate::gateway::{BotIdentity, Connection, Connector};
use crate::token::BotToken;

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Events buffered between the socket task and the session
const EVENT_BUFFER: usize = 256;

/// Endpoints and timeouts for [`DiscordConnector`]
#[derive(Debug, Clone, PartialEq)]
pub struct DiscordConfig {
    pub gateway_url: String,
    pub api_base: String,
    /// Upper bound for socket connect plus READY
    pub handshake_timeout: Duration,
    /// How long to wait after READY for the announced guilds
    pub guild_ready_timeout: Duration,
    pub intents: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            handshake_timeout: Duration::from_secs(15),
            guild_ready_timeout: Duration::from_secs(2),
            intents: protocol::intents::DEFAULT,
        }
    }
}

/// Connects to the Discord gateway
pub struct DiscordConnector {
    config: DiscordConfig,
}

impl DiscordConnector {
    pub fn new(config: DiscordConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }
}

impl Default for DiscordConnector {
    fn default() -> Self {
        Self::new(DiscordConfig::default())
    }
}

#[async_trait]
impl Connector for DiscordConnector {
    async fn connect(
        &self,
        token: &BotToken,
    ) -> Result<(Box<dyn Connection>, BotIdentity), GatewayError> {
        let api = Arc::new(
            RestClient::new(&self.config.api_base, token)
                .map_err(|e| GatewayError::Transport(e.to_string()))?,
        );

        debug!(url = %self.config.gateway_url, "Opening gateway socket");
        let (socket, _response) = tokio::time::timeout(
            self.config.handshake_timeout,
            tokio_tungstenite::connect_async(self.config.gateway_url.as_str()),
        )
        .await
        .map_err(|_| GatewayError::Timeout("gateway connection"))?
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let latency = connection::no_latency();
        let shutdown = CancellationToken::new();

        let task = GatewayTask::new(
            socket,
            token.clone(),
            self.config.intents,
            self.config.guild_ready_timeout,
            ready_tx,
            events_tx,
            Arc::clone(&latency),
        );
        let handle = tokio::spawn(task.run(shutdown.clone()));
        // Dropping the connection (e.g. a cancelled connect) stops the task
        let mut connection = DiscordConnection::new(events_rx, api, latency, shutdown, handle);

        match tokio::time::timeout(self.config.handshake_timeout, ready_rx).await {
            Ok(Ok(Ok(identity))) => Ok((Box::new(connection), identity)),
            Ok(Ok(Err(e))) => {
                connection.close().await;
                Err(e)
            }
            Ok(Err(_)) => {
                connection.close().await;
                Err(GatewayError::Closed {
                    code: None,
                    reason: "gateway task ended before READY".into(),
                })
            }
            Err(_) => {
                connection.close().await;
                Err(GatewayError::Timeout("READY"))
            }
        }
    }
}
