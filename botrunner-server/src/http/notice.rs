//! One-shot notices shown on the control page after a form post

use botrunner_core::LifecycleError;

/// Outcome of a form action, carried as `/?notice=<code>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Started,
    Stopped,
    AlreadyRunning,
    NotRunning,
    InvalidToken,
    ConnectFailed,
    Disconnected,
}

impl Notice {
    const ALL: [Notice; 7] = [
        Notice::Started,
        Notice::Stopped,
        Notice::AlreadyRunning,
        Notice::NotRunning,
        Notice::InvalidToken,
        Notice::ConnectFailed,
        Notice::Disconnected,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::AlreadyRunning => "already_running",
            Self::NotRunning => "not_running",
            Self::InvalidToken => "invalid_token",
            Self::ConnectFailed => "connect_failed",
            Self::Disconnected => "disconnected",
        }
    }

    /// Alert style used by the page
    pub fn level(&self) -> &'static str {
        match self {
            Self::Started | Self::Stopped => "success",
            Self::AlreadyRunning | Self::NotRunning => "warning",
            Self::InvalidToken | Self::ConnectFailed | Self::Disconnected => "error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Started => "Bot started successfully!",
            Self::Stopped => "Bot stopped successfully!",
            Self::AlreadyRunning => {
                "The bot is already running. Stop it before starting with a new token."
            }
            Self::NotRunning => "No bot is currently running.",
            Self::InvalidToken => {
                "Invalid token format. Discord bot tokens are usually longer."
            }
            Self::ConnectFailed => "Failed to start bot - check token validity.",
            Self::Disconnected => "Bot disconnected unexpectedly.",
        }
    }

    /// Redirect target for the control page
    pub fn location(&self) -> String {
        format!("/?notice={}", self.code())
    }
}

impl From<&LifecycleError> for Notice {
    fn from(err: &LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyRunning => Self::AlreadyRunning,
            LifecycleError::NotRunning => Self::NotRunning,
            LifecycleError::InvalidToken => Self::InvalidToken,
            LifecycleError::ConnectFailed(_) => Self::ConnectFailed,
            LifecycleError::DisconnectedUnexpectedly(_) => Self::Disconnected,
        }
    }
}
