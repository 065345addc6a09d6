//! Bot session
//!
//! A session owns one gateway connection for its whole life: it connects,
//! reports readiness, dispatches chat commands, and reports how it ended.
//! Each command runs as its own task so a long `!timer` never delays
//! other commands. Cancelling the session's token ends it cleanly.

pub mod runner;

use std::sync::Arc;

use botrunner_commands::{CommandTable, Invocation};
use chrono::Utc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gateway::{BotIdentity, Connection, Connector, GatewayEvent, InboundMessage};
use crate::token::BotToken;

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    /// Cancelled by its owner
    Requested,
    /// The handshake did not complete
    ConnectFailed(String),
    /// The connection was lost after the handshake
    Disconnected(String),
}

/// Receives lifecycle notifications from a running session
///
/// Both calls happen on the session task and must not block.
pub trait SessionObserver: Send + Sync {
    /// Handshake completed
    fn on_ready(&self, identity: &BotIdentity);

    /// Session ended on its own; not called for [`SessionExit::Requested`]
    fn on_disconnect(&self, exit: &SessionExit);
}

/// One connection's worth of bot activity
pub struct Session {
    id: Uuid,
    token: BotToken,
    connector: Arc<dyn Connector>,
    commands: Arc<CommandTable>,
    observer: Arc<dyn SessionObserver>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(
        id: Uuid,
        token: BotToken,
        connector: Arc<dyn Connector>,
        commands: Arc<CommandTable>,
        observer: Arc<dyn SessionObserver>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            token,
            connector,
            commands,
            observer,
            cancel,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run until cancelled or disconnected
    pub async fn run(self) -> SessionExit {
        let connected = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(session_id = %self.id, "Session cancelled during handshake");
                return SessionExit::Requested;
            }
            result = self.connector.connect(&self.token) => result,
        };

        let (mut connection, identity) = match connected {
            Ok(pair) => pair,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Handshake failed");
                let exit = SessionExit::ConnectFailed(e.to_string());
                self.observer.on_disconnect(&exit);
                return exit;
            }
        };

        info!(
            session_id = %self.id,
            bot = %identity.name,
            guilds = identity.guilds,
            users = identity.users,
            "Bot connected"
        );
        self.observer.on_ready(&identity);

        let mut tasks = JoinSet::new();
        let exit = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break SessionExit::Requested,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(session_id = %self.id, "Command task panicked");
                        }
                    }
                }
                event = connection.next_event() => match event {
                    Ok(Some(GatewayEvent::Message(message))) => {
                        self.handle_message(message, &identity, connection.as_ref(), &mut tasks);
                    }
                    Ok(Some(GatewayEvent::GuildJoined { id, name })) => {
                        info!(session_id = %self.id, guild_id = %id, guild = %name, "Joined guild");
                    }
                    Ok(Some(GatewayEvent::GuildLeft { id })) => {
                        info!(session_id = %self.id, guild_id = %id, "Left guild");
                    }
                    Ok(None) => break SessionExit::Disconnected("connection closed".into()),
                    Err(e) => break SessionExit::Disconnected(e.to_string()),
                },
            }
        };

        tasks.abort_all();
        connection.close().await;

        match &exit {
            SessionExit::Requested => info!(session_id = %self.id, "Session stopped"),
            other => {
                warn!(session_id = %self.id, exit = ?other, "Session ended unexpectedly");
                self.observer.on_disconnect(other);
            }
        }
        exit
    }

    fn handle_message(
        &self,
        message: InboundMessage,
        identity: &BotIdentity,
        connection: &dyn Connection,
        tasks: &mut JoinSet<()>,
    ) {
        if message.author.bot || message.author.id == identity.id {
            return;
        }
        let Some((name, args)) = self.commands.parse(&message.content) else {
            return;
        };

        debug!(
            session_id = %self.id,
            command = %name,
            channel_id = %message.channel_id,
            "Dispatching command"
        );

        let mut invocation = Invocation::new(name, args, message.author)
            .with_prefix(self.commands.prefix())
            .with_channel(message.channel_id.clone())
            .with_permissions(message.permissions)
            .with_mentions(message.mentions)
            .with_bot(identity.snapshot(connection.latency()))
            .with_now(Utc::now());
        if let Some(guild) = message.guild {
            invocation = invocation.with_guild(guild);
        }

        let commands = Arc::clone(&self.commands);
        let api = connection.api();
        let channel_id = message.channel_id;
        tasks.spawn(async move {
            let output = commands.dispatch(&invocation);
            runner::execute(api.as_ref(), &channel_id, output).await;
        });
    }
}
