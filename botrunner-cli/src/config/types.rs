use std::time::Duration;

use botrunner_commands::DEFAULT_PREFIX;
use botrunner_core::gateway::discord::{DEFAULT_API_BASE, DEFAULT_GATEWAY_URL};
use botrunner_core::{DEFAULT_MIN_TOKEN_LENGTH, DiscordConfig, ManagerConfig};
use serde::{Deserialize, Serialize};

pub use botrunner_server::{DEFAULT_HOST, DEFAULT_PORT};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBotRunnerConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub bot: RawBotConfig,

    #[serde(default)]
    pub discord: RawDiscordConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBotConfig {
    pub prefix: Option<String>,
    pub min_token_length: Option<usize>,
    pub start_probe_ms: Option<u64>,
    pub stop_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDiscordConfig {
    pub gateway_url: Option<String>,
    pub api_base: Option<String>,
    pub handshake_timeout_ms: Option<u64>,
    pub guild_ready_timeout_ms: Option<u64>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BotRunnerConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub discord: DiscordSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address the web shell binds to
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Base URL of the web shell; a wildcard bind is reached over loopback
    pub fn base_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" => "127.0.0.1",
            "::" => "[::1]",
            host => host,
        };
        format!("http://{}:{}", host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotConfig {
    /// Command prefix, e.g. `!` for `!ping`
    pub prefix: String,
    pub min_token_length: usize,
    /// How long a start waits to confirm the session is alive
    pub start_probe_ms: u64,
    /// How long a stop waits before abandoning the session
    pub stop_timeout_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        let manager = ManagerConfig::default();
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            start_probe_ms: manager.start_probe.as_millis() as u64,
            stop_timeout_ms: manager.stop_timeout.as_millis() as u64,
        }
    }
}

impl BotConfig {
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            min_token_length: self.min_token_length,
            start_probe: Duration::from_millis(self.start_probe_ms),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
            ..ManagerConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordSection {
    pub gateway_url: String,
    pub api_base: String,
    pub handshake_timeout_ms: u64,
    pub guild_ready_timeout_ms: u64,
}

impl Default for DiscordSection {
    fn default() -> Self {
        let discord = DiscordConfig::default();
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            handshake_timeout_ms: discord.handshake_timeout.as_millis() as u64,
            guild_ready_timeout_ms: discord.guild_ready_timeout.as_millis() as u64,
        }
    }
}

impl DiscordSection {
    pub fn connector_config(&self) -> DiscordConfig {
        DiscordConfig {
            gateway_url: self.gateway_url.clone(),
            api_base: self.api_base.clone(),
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            guild_ready_timeout: Duration::from_millis(self.guild_ready_timeout_ms),
            ..DiscordConfig::default()
        }
    }
}
