//! Connector, Connection and ChatApi traits
//!
//! These are the seams between a bot session and the chat service. The
//! Discord implementation lives in [`super::discord`]; tests script the
//! same traits with [`super::mock`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use botrunner_commands::{BotSnapshot, GuildInfo, ModAction, Permissions, Reply, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, GatewayError};
use crate::token::BotToken;

/// Who the bot is once the handshake completed
///
/// Serializes to the `info` object of the status payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    /// Display name of the bot account
    pub name: String,
    /// Account id, as a decimal string
    pub id: String,
    /// Number of guilds the bot is a member of
    pub guilds: usize,
    /// Sum of member counts across those guilds
    pub users: u64,
    #[serde(skip)]
    pub avatar_url: Option<String>,
}

impl BotIdentity {
    pub fn new(name: impl Into<String>, id: impl Into<String>, guilds: usize, users: u64) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            guilds,
            users,
            avatar_url: None,
        }
    }

    /// Snapshot handed to command handlers
    pub fn snapshot(&self, latency: Option<Duration>) -> BotSnapshot {
        BotSnapshot {
            name: self.name.clone(),
            id: self.id.clone(),
            avatar_url: self.avatar_url.clone(),
            guilds: self.guilds,
            users: self.users,
            latency,
        }
    }
}

/// A chat message as delivered by the gateway
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub author: UserProfile,
    /// Set for messages sent in a guild channel
    pub guild: Option<GuildInfo>,
    /// Author's resolved permissions in the channel's guild
    pub permissions: Permissions,
    pub mentions: Vec<UserProfile>,
    pub timestamp: DateTime<Utc>,
}

/// Events surfaced to the session after the handshake
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Message(InboundMessage),
    GuildJoined { id: String, name: String },
    GuildLeft { id: String },
}

/// Opens authenticated connections to the chat service
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticate and wait for the ready handshake
    ///
    /// Returns the live connection and the identity it reported.
    async fn connect(
        &self,
        token: &BotToken,
    ) -> Result<(Box<dyn Connection>, BotIdentity), GatewayError>;
}

/// A live gateway connection
#[async_trait]
pub trait Connection: Send {
    /// Next event, `Ok(None)` once the connection is closed
    ///
    /// Must be cancel safe; the session polls it inside `select!`.
    async fn next_event(&mut self) -> Result<Option<GatewayEvent>, GatewayError>;

    /// REST client bound to this connection's credentials
    fn api(&self) -> Arc<dyn ChatApi>;

    /// Round trip of the last acknowledged heartbeat
    fn latency(&self) -> Option<Duration>;

    /// Close the connection
    async fn close(&mut self);
}

/// Outbound calls made while executing command steps
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send a reply, returning the new message id
    async fn send_message(&self, channel_id: &str, reply: &Reply) -> Result<String, ApiError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ApiError>;

    /// Open a direct conversation and send a reply, returning the message id
    async fn send_direct_message(&self, user_id: &str, reply: &Reply) -> Result<String, ApiError>;

    async fn moderate(&self, action: &ModAction) -> Result<(), ApiError>;

    /// Delete up to `limit` recent messages; returns how many were deleted
    async fn purge(&self, channel_id: &str, limit: u32) -> Result<usize, ApiError>;
}
