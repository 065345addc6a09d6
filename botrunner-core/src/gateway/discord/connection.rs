//! Gateway socket task and the connection handle built on it
//!
//! One task owns the websocket. It answers Hello with Identify, keeps the
//! heartbeat going, folds guild dispatches into the [`GuildCache`], and
//! forwards chat messages to the session through a channel. Readiness is
//! reported once through a oneshot so `connect` can wait for it.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use botrunner_commands::Permissions;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::GuildCache;
use super::protocol::{
    self, CLOSE_AUTHENTICATION_FAILED, Channel, Guild, GuildDelete, GuildMemberEvent,
    GuildRoleDelete, GuildRoleEvent, Hello, MessageCreate, Payload, Ready, User, opcode,
};
use super::rest::RestClient;
use crate::error::GatewayError;
use crate::gateway::{BotIdentity, ChatApi, Connection, GatewayEvent, InboundMessage};
use crate::token::BotToken;

pub(super) type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(super) type ReadySender = oneshot::Sender<Result<BotIdentity, GatewayError>>;
type EventResult = Result<GatewayEvent, GatewayError>;

/// Latency value meaning no heartbeat was acknowledged yet
const NO_LATENCY: u64 = u64::MAX;

/// How long `close` waits for the socket task
const CLOSE_GRACE: Duration = Duration::from_secs(1);

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, GatewayError> {
    serde_json::from_value(data).map_err(|e| GatewayError::Protocol(e.to_string()))
}

fn close_error(frame: Option<CloseFrame>) -> GatewayError {
    match frame {
        Some(frame) if u16::from(frame.code) == CLOSE_AUTHENTICATION_FAILED => {
            GatewayError::AuthenticationFailed
        }
        Some(frame) => GatewayError::Closed {
            code: Some(u16::from(frame.code)),
            reason: frame.reason.as_str().to_string(),
        },
        None => GatewayError::Closed {
            code: None,
            reason: "closed without a close frame".into(),
        },
    }
}

pub(super) struct GatewayTask {
    socket: Socket,
    token: BotToken,
    intents: u64,
    guild_ready_timeout: Duration,
    cache: GuildCache,
    sequence: Option<u64>,
    me: Option<User>,
    pending_guilds: HashSet<String>,
    guild_deadline: Option<Instant>,
    ready_tx: Option<ReadySender>,
    events: mpsc::Sender<EventResult>,
    latency_ms: Arc<AtomicU64>,
    awaiting_ack: bool,
    heartbeat_sent: Option<Instant>,
}

impl GatewayTask {
    pub(super) fn new(
        socket: Socket,
        token: BotToken,
        intents: u64,
        guild_ready_timeout: Duration,
        ready_tx: ReadySender,
        events: mpsc::Sender<EventResult>,
        latency_ms: Arc<AtomicU64>,
    ) -> Self {
        Self {
            socket,
            token,
            intents,
            guild_ready_timeout,
            cache: GuildCache::default(),
            sequence: None,
            me: None,
            pending_guilds: HashSet::new(),
            guild_deadline: None,
            ready_tx: Some(ready_tx),
            events,
            latency_ms,
            awaiting_ack: false,
            heartbeat_sent: None,
        }
    }

    pub(super) async fn run(mut self, shutdown: CancellationToken) {
        match self.drive(&shutdown).await {
            Ok(()) => {
                debug!("Gateway task shutting down");
                let _ = self.socket.close(None).await;
            }
            Err(e) => {
                debug!(error = %e, "Gateway task ended");
                self.fail(e).await;
            }
        }
    }

    async fn drive(&mut self, shutdown: &CancellationToken) -> Result<(), GatewayError> {
        let interval = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            hello = self.read_hello() => hello?,
        };
        debug!(interval_ms = interval.as_millis() as u64, "Gateway hello");
        self.send(protocol::identify(&self.token, self.intents)).await?;

        let mut heartbeat = tokio::time::interval_at(Instant::now() + interval, interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.guild_deadline;
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = heartbeat.tick() => self.beat().await?,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.publish_ready();
                }
                frame = self.socket.next() => self.on_frame(frame).await?,
            }
        }
    }

    async fn read_hello(&mut self) -> Result<Duration, GatewayError> {
        loop {
            let frame = self.socket.next().await;
            match frame {
                Some(Ok(Message::Text(text))) => {
                    let payload: Payload = serde_json::from_str(text.as_str())
                        .map_err(|e| GatewayError::Protocol(e.to_string()))?;
                    if payload.op == opcode::HELLO {
                        let hello: Hello = decode(payload.d)?;
                        return Ok(Duration::from_millis(hello.heartbeat_interval));
                    }
                }
                other => self.on_frame(other).await?,
            }
        }
    }

    async fn send(&mut self, payload: Value) -> Result<(), GatewayError> {
        self.socket
            .send(Message::text(payload.to_string()))
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    /// Scheduled heartbeat; a missing ack for the previous one means the link is dead
    async fn beat(&mut self) -> Result<(), GatewayError> {
        if self.awaiting_ack {
            return Err(GatewayError::Zombied);
        }
        self.send_heartbeat().await
    }

    async fn send_heartbeat(&mut self) -> Result<(), GatewayError> {
        self.send(protocol::heartbeat(self.sequence)).await?;
        self.awaiting_ack = true;
        self.heartbeat_sent = Some(Instant::now());
        Ok(())
    }

    async fn on_frame(
        &mut self,
        frame: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    ) -> Result<(), GatewayError> {
        match frame {
            Some(Ok(Message::Text(text))) => self.on_payload(text.as_str()).await,
            Some(Ok(Message::Close(frame))) => Err(close_error(frame)),
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(GatewayError::Transport(e.to_string())),
            None => Err(close_error(None)),
        }
    }

    async fn on_payload(&mut self, text: &str) -> Result<(), GatewayError> {
        let payload: Payload =
            serde_json::from_str(text).map_err(|e| GatewayError::Protocol(e.to_string()))?;
        if payload.s.is_some() {
            self.sequence = payload.s;
        }

        match payload.op {
            opcode::DISPATCH => {
                let kind = payload.t.unwrap_or_default();
                if let Err(e) = self.on_dispatch(&kind, payload.d).await {
                    warn!(event = %kind, error = %e, "Ignoring malformed dispatch");
                }
                Ok(())
            }
            opcode::HEARTBEAT => self.send_heartbeat().await,
            opcode::HEARTBEAT_ACK => {
                self.awaiting_ack = false;
                if let Some(sent) = self.heartbeat_sent.take() {
                    let ms = sent.elapsed().as_millis().min(u128::from(u64::MAX - 1)) as u64;
                    self.latency_ms.store(ms, Ordering::Relaxed);
                }
                Ok(())
            }
            opcode::RECONNECT => Err(GatewayError::ReconnectRequested),
            opcode::INVALID_SESSION => Err(GatewayError::InvalidSession),
            _ => Ok(()),
        }
    }

    async fn on_dispatch(&mut self, kind: &str, data: Value) -> Result<(), GatewayError> {
        match kind {
            "READY" => {
                let ready: Ready = decode(data)?;
                self.pending_guilds = ready.guilds.into_iter().map(|g| g.id).collect();
                info!(
                    bot = %ready.user.tag(),
                    guilds = self.pending_guilds.len(),
                    "Gateway ready"
                );
                self.me = Some(ready.user);
                if self.pending_guilds.is_empty() {
                    self.publish_ready();
                } else {
                    self.guild_deadline = Some(Instant::now() + self.guild_ready_timeout);
                }
            }
            "GUILD_CREATE" => {
                let guild: Guild = decode(data)?;
                let (id, name) = (guild.id.clone(), guild.name.clone());
                let known = self.cache.contains(&id);
                self.cache.upsert(guild);
                if self.pending_guilds.remove(&id) {
                    if self.pending_guilds.is_empty() && self.ready_tx.is_some() {
                        self.publish_ready();
                    }
                } else if !known && self.ready_tx.is_none() {
                    self.emit(GatewayEvent::GuildJoined { id, name }).await;
                }
            }
            "GUILD_UPDATE" => self.cache.upsert(decode(data)?),
            "GUILD_DELETE" => {
                let deleted: GuildDelete = decode(data)?;
                // Outages keep the guild; only removals drop it
                if !deleted.unavailable && self.cache.remove(&deleted.id).is_some() {
                    self.emit(GatewayEvent::GuildLeft { id: deleted.id }).await;
                }
            }
            "GUILD_MEMBER_ADD" => {
                let event: GuildMemberEvent = decode(data)?;
                self.cache.member_added(&event.guild_id);
            }
            "GUILD_MEMBER_REMOVE" => {
                let event: GuildMemberEvent = decode(data)?;
                self.cache.member_removed(&event.guild_id);
            }
            "GUILD_ROLE_CREATE" | "GUILD_ROLE_UPDATE" => {
                let event: GuildRoleEvent = decode(data)?;
                self.cache.role_upsert(&event.guild_id, event.role);
            }
            "GUILD_ROLE_DELETE" => {
                let event: GuildRoleDelete = decode(data)?;
                self.cache.role_remove(&event.guild_id, &event.role_id);
            }
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" => self.cache.channel_upsert(decode(data)?),
            "CHANNEL_DELETE" => {
                let channel: Channel = decode(data)?;
                self.cache.channel_remove(&channel);
            }
            "MESSAGE_CREATE" => {
                let message: MessageCreate = decode(data)?;
                let inbound = self.inbound(message);
                self.emit(GatewayEvent::Message(inbound)).await;
            }
            _ => {}
        }
        Ok(())
    }

    /// Hand the identity to `connect`, once
    fn publish_ready(&mut self) {
        self.guild_deadline = None;
        let Some(me) = self.me.as_ref() else {
            return;
        };
        let Some(ready_tx) = self.ready_tx.take() else {
            return;
        };
        if !self.pending_guilds.is_empty() {
            debug!(
                missing = self.pending_guilds.len(),
                "Publishing identity before every guild arrived"
            );
        }

        let mut identity = BotIdentity::new(
            me.tag(),
            me.id.clone(),
            self.cache.len(),
            self.cache.total_members(),
        );
        identity.avatar_url = me.avatar_url();
        let _ = ready_tx.send(Ok(identity));
    }

    fn inbound(&self, message: MessageCreate) -> InboundMessage {
        let guild_id = message.guild_id.as_deref();
        let roles = message
            .member
            .as_ref()
            .map(|m| m.roles.as_slice())
            .unwrap_or_default();

        let author = self
            .cache
            .profile(&message.author, message.member.as_ref(), guild_id);
        let permissions = match guild_id {
            Some(guild_id) => self.cache.permissions(guild_id, &message.author.id, roles),
            None => Permissions::NONE,
        };
        let mentions = message
            .mentions
            .iter()
            .map(|m| self.cache.profile(&m.user, m.member.as_ref(), guild_id))
            .collect();
        let guild = guild_id.and_then(|id| self.cache.guild_info(id));

        InboundMessage {
            id: message.id,
            channel_id: message.channel_id,
            content: message.content,
            author,
            guild,
            permissions,
            mentions,
            timestamp: message.timestamp,
        }
    }

    async fn emit(&self, event: GatewayEvent) {
        let _ = self.events.send(Ok(event)).await;
    }

    /// Report a fatal error to whoever is waiting
    async fn fail(&mut self, error: GatewayError) {
        match self.ready_tx.take() {
            Some(ready_tx) => {
                let _ = ready_tx.send(Err(error));
            }
            None => {
                let _ = self.events.send(Err(error)).await;
            }
        }
    }
}

/// Live Discord connection
pub struct DiscordConnection {
    events: mpsc::Receiver<EventResult>,
    api: Arc<RestClient>,
    latency_ms: Arc<AtomicU64>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DiscordConnection {
    pub(super) fn new(
        events: mpsc::Receiver<EventResult>,
        api: Arc<RestClient>,
        latency_ms: Arc<AtomicU64>,
        shutdown: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            api,
            latency_ms,
            shutdown,
            task: Some(task),
        }
    }
}

#[async_trait]
impl Connection for DiscordConnection {
    async fn next_event(&mut self) -> Result<Option<GatewayEvent>, GatewayError> {
        match self.events.recv().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    fn api(&self) -> Arc<dyn ChatApi> {
        self.api.clone()
    }

    fn latency(&self) -> Option<Duration> {
        match self.latency_ms.load(Ordering::Relaxed) {
            NO_LATENCY => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    async fn close(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(CLOSE_GRACE, task).await.is_err() {
                debug!("Gateway task did not finish closing in time");
            }
        }
    }
}

impl Drop for DiscordConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Initial value for the shared latency cell
pub(super) fn no_latency() -> Arc<AtomicU64> {
    Arc::new(AtomicU64::new(NO_LATENCY))
}

#[cfg(test)]
mod tests {
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    use super::*;

    #[test]
    fn close_4004_is_authentication_failure() {
        let frame = CloseFrame {
            code: CloseCode::from(4004),
            reason: "Authentication failed.".into(),
        };
        assert_eq!(close_error(Some(frame)), GatewayError::AuthenticationFailed);
    }

    #[test]
    fn other_close_codes_keep_reason() {
        let frame = CloseFrame {
            code: CloseCode::from(4014),
            reason: "Disallowed intent(s).".into(),
        };
        assert_eq!(
            close_error(Some(frame)),
            GatewayError::Closed {
                code: Some(4014),
                reason: "Disallowed intent(s).".into()
            }
        );
        assert!(matches!(close_error(None), GatewayError::Closed { code: None, .. }));
    }

    #[test]
    fn malformed_data_is_protocol_error() {
        let result: Result<Hello, _> = decode(serde_json::json!({ "nope": 1 }));
        assert!(matches!(result, Err(GatewayError::Protocol(_))));
    }
}
