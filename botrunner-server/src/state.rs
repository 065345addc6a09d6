//! Shared application state for the botrunner server

use std::sync::Arc;

use botrunner_core::BotManager;
use chrono::{DateTime, Utc};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The single managed bot
    pub bot: Arc<BotManager>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(bot: Arc<BotManager>) -> Self {
        Self {
            bot,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
