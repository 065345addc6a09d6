//! Mock gateway for testing
//!
//! MockConnector scripts the handshake (delay, failure, or never
//! completing) and lets tests inject events into the active connection.
//! RecordingChatApi captures every outbound call so tests can assert on
//! what a command actually sent.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use botrunner_commands::{GuildInfo, ModAction, Permissions, Reply, UserProfile};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::traits::{BotIdentity, ChatApi, Connection, Connector, GatewayEvent, InboundMessage};
use crate::error::{ApiError, GatewayError};
use crate::token::BotToken;

type EventTx = mpsc::UnboundedSender<Result<GatewayEvent, GatewayError>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scriptable implementation of [`Connector`]
pub struct MockConnector {
    identity: BotIdentity,
    handshake_delay: Duration,
    close_delay: Duration,
    failure: Option<GatewayError>,
    hang: bool,
    api: Arc<RecordingChatApi>,
    active: Mutex<Option<EventTx>>,
    connects: AtomicUsize,
}

impl MockConnector {
    /// Connector whose handshakes succeed immediately
    pub fn new() -> Self {
        Self {
            identity: BotIdentity::new("MockBot#0001", "1000000000000000001", 2, 25),
            handshake_delay: Duration::ZERO,
            close_delay: Duration::ZERO,
            failure: None,
            hang: false,
            api: Arc::new(RecordingChatApi::new()),
            active: Mutex::new(None),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn with_identity(mut self, identity: BotIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Delay every handshake by `delay`
    pub fn with_handshake_delay(mut self, delay: Duration) -> Self {
        self.handshake_delay = delay;
        self
    }

    /// Make `Connection::close` take `delay`
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = delay;
        self
    }

    /// Fail every handshake with `error` after the handshake delay
    pub fn failing(mut self, error: GatewayError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Handshakes never complete
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Chat API shared by every connection
    pub fn api(&self) -> Arc<RecordingChatApi> {
        Arc::clone(&self.api)
    }

    /// Number of handshakes attempted so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Deliver an event on the most recent connection
    ///
    /// Returns false when no connection is open.
    pub fn inject(&self, event: GatewayEvent) -> bool {
        lock(&self.active)
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(event)).is_ok())
    }

    /// Fail the most recent connection with `error`
    pub fn fail_connection(&self, error: GatewayError) -> bool {
        lock(&self.active)
            .as_ref()
            .is_some_and(|tx| tx.send(Err(error)).is_ok())
    }

    /// Close the most recent connection from the service side
    pub fn drop_connection(&self) {
        lock(&self.active).take();
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        _token: &BotToken,
    ) -> Result<(Box<dyn Connection>, BotIdentity), GatewayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if !self.handshake_delay.is_zero() {
            tokio::time::sleep(self.handshake_delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.active) = Some(tx);
        let connection = MockConnection {
            events: rx,
            api: Arc::clone(&self.api),
            close_delay: self.close_delay,
        };
        Ok((Box::new(connection), self.identity.clone()))
    }
}

/// Connection handed out by [`MockConnector`]
pub struct MockConnection {
    events: mpsc::UnboundedReceiver<Result<GatewayEvent, GatewayError>>,
    api: Arc<RecordingChatApi>,
    close_delay: Duration,
}

#[async_trait]
impl Connection for MockConnection {
    async fn next_event(&mut self) -> Result<Option<GatewayEvent>, GatewayError> {
        match self.events.recv().await {
            Some(Ok(event)) => Ok(Some(event)),
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }

    fn api(&self) -> Arc<dyn ChatApi> {
        self.api.clone()
    }

    fn latency(&self) -> Option<Duration> {
        Some(Duration::from_millis(42))
    }

    async fn close(&mut self) {
        if !self.close_delay.is_zero() {
            tokio::time::sleep(self.close_delay).await;
        }
        self.events.close();
    }
}

/// One outbound call recorded by [`RecordingChatApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Send { channel_id: String, reply: Reply },
    React { message_id: String, emoji: String },
    Delete { message_id: String },
    DirectMessage { user_id: String, reply: Reply },
    Moderate(ModAction),
    Purge { channel_id: String, limit: u32 },
}

/// [`ChatApi`] that records calls instead of performing them
pub struct RecordingChatApi {
    calls: Mutex<Vec<ApiCall>>,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    fail_moderation: AtomicBool,
    fail_direct_messages: AtomicBool,
}

impl RecordingChatApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_sends: AtomicBool::new(false),
            fail_moderation: AtomicBool::new(false),
            fail_direct_messages: AtomicBool::new(false),
        }
    }

    /// Reject every channel send with `Forbidden`
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Reject every moderation call with `Forbidden`
    pub fn fail_moderation(&self, fail: bool) {
        self.fail_moderation.store(fail, Ordering::SeqCst);
    }

    /// Reject direct messages, as when a user has them disabled
    pub fn fail_direct_messages(&self, fail: bool) {
        self.fail_direct_messages.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    /// Replies sent to channels, in order
    pub fn sent(&self) -> Vec<Reply> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ApiCall::Send { reply, .. } => Some(reply.clone()),
                _ => None,
            })
            .collect()
    }

    /// Poll until at least `count` calls were recorded or `within` elapsed
    pub async fn wait_for_calls(&self, count: usize, within: Duration) -> Vec<ApiCall> {
        let deadline = Instant::now() + within;
        loop {
            let calls = self.calls();
            if calls.len() >= count || Instant::now() >= deadline {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn record(&self, call: ApiCall) {
        lock(&self.calls).push(call);
    }

    fn next_message_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

impl Default for RecordingChatApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatApi for RecordingChatApi {
    async fn send_message(&self, channel_id: &str, reply: &Reply) -> Result<String, ApiError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ApiError::Forbidden);
        }
        self.record(ApiCall::Send {
            channel_id: channel_id.to_string(),
            reply: reply.clone(),
        });
        Ok(self.next_message_id())
    }

    async fn add_reaction(
        &self,
        _channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::React {
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, _channel_id: &str, message_id: &str) -> Result<(), ApiError> {
        self.record(ApiCall::Delete {
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &str, reply: &Reply) -> Result<String, ApiError> {
        if self.fail_direct_messages.load(Ordering::SeqCst) {
            return Err(ApiError::Forbidden);
        }
        self.record(ApiCall::DirectMessage {
            user_id: user_id.to_string(),
            reply: reply.clone(),
        });
        Ok(self.next_message_id())
    }

    async fn moderate(&self, action: &ModAction) -> Result<(), ApiError> {
        self.record(ApiCall::Moderate(action.clone()));
        if self.fail_moderation.load(Ordering::SeqCst) {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }

    async fn purge(&self, channel_id: &str, limit: u32) -> Result<usize, ApiError> {
        self.record(ApiCall::Purge {
            channel_id: channel_id.to_string(),
            limit,
        });
        Ok(limit as usize)
    }
}

/// Guild message from `author` in channel `"500"` of guild `"400"`
pub fn guild_message(author: UserProfile, content: &str) -> InboundMessage {
    InboundMessage {
        id: format!("m-{}", content.len()),
        channel_id: "500".into(),
        content: content.to_string(),
        author,
        guild: Some(GuildInfo::new("400", "Mock Guild")),
        permissions: Permissions::NONE,
        mentions: Vec::new(),
        timestamp: Utc::now(),
    }
}
