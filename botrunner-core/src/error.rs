//! Error types for botrunner-core

use thiserror::Error;

/// Failures of the bot lifecycle (start, stop, unexpected exits)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Bot is already running")]
    AlreadyRunning,

    #[error("No bot is currently running")]
    NotRunning,

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Failed to start bot - check token validity: {0}")]
    ConnectFailed(String),

    #[error("Bot disconnected unexpectedly: {0}")]
    DisconnectedUnexpectedly(String),
}

impl LifecycleError {
    /// Stable machine-readable code, also used as the web notice key
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "already_running",
            Self::NotRunning => "not_running",
            Self::InvalidToken => "invalid_token",
            Self::ConnectFailed(_) => "connect_failed",
            Self::DisconnectedUnexpectedly(_) => "disconnected",
        }
    }
}

/// Errors from the realtime gateway connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Authentication failed: the token was rejected")]
    AuthenticationFailed,

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection closed (code {code:?}): {reason}")]
    Closed { code: Option<u16>, reason: String },

    #[error("Heartbeat was not acknowledged")]
    Zombied,

    #[error("Gateway requested a reconnect")]
    ReconnectRequested,

    #[error("Gateway invalidated the session")]
    InvalidSession,
}

/// Errors from chat service REST calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Missing access")]
    Forbidden,

    #[error("Unknown resource")]
    NotFound,

    #[error("Rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<f64> },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),
}
