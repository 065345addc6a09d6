//! botrunner config: inspect the merged configuration

use std::path::PathBuf;

use anyhow::Result;
use botrunner_core::BotToken;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::run::TOKEN_ENV;
use crate::config::{BotRunnerConfig, ConfigLoader};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the merged configuration and what it resolves to
    Show {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// List the config files in merge order
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { json } => show_config(json),
        ConfigCommands::Path => show_paths(),
    }
}

/// Whether a token is available to `botrunner run`, without the token itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Missing,
    Malformed,
    Present,
}

impl TokenState {
    pub fn detect(value: Option<&str>, min_length: usize) -> Self {
        match value {
            None => Self::Missing,
            Some(raw) if raw.trim().is_empty() => Self::Missing,
            Some(raw) => match BotToken::parse(raw, min_length) {
                Ok(_) => Self::Present,
                Err(_) => Self::Malformed,
            },
        }
    }

    fn describe(self, min_length: usize) -> String {
        match self {
            Self::Missing => format!("{} is not set", TOKEN_ENV),
            Self::Malformed => format!(
                "{} is set but fails the format check (min {} chars)",
                TOKEN_ENV, min_length
            ),
            Self::Present => format!("{} is set", TOKEN_ENV),
        }
    }
}

#[derive(Debug, Serialize)]
struct Resolved<'a> {
    config: &'a BotRunnerConfig,
    web_url: String,
    token: TokenState,
}

fn show_config(json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let env_token = std::env::var(TOKEN_ENV).ok();
    let token = TokenState::detect(env_token.as_deref(), config.bot.min_token_length);
    let web_url = config.server.base_url();

    if json {
        let resolved = Resolved {
            config: &config,
            web_url,
            token,
        };
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    println!("{}", toml::to_string_pretty(&config)?);
    println!("# Web shell: {}", web_url);
    println!("# Token:     {}", token.describe(config.bot.min_token_length));
    Ok(())
}

/// Config layers, lowest precedence first
fn layers() -> [(&'static str, PathBuf); 2] {
    [
        ("user", ConfigLoader::user_config_path()),
        ("project", ConfigLoader::project_config_path()),
    ]
}

fn show_paths() -> Result<()> {
    for (layer, path) in layers() {
        let state = if path.exists() { "found" } else { "not found" };
        println!("{:<8} {} ({})", layer, path.display(), state);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "MTA5ODc2NTQzMjEwOTg3NjU0.GxYzAb.abcdefghijklmnopqrstuvwxyz0123456789";

    #[test]
    fn token_state_detection() {
        assert_eq!(TokenState::detect(None, 50), TokenState::Missing);
        assert_eq!(TokenState::detect(Some("  "), 50), TokenState::Missing);
        assert_eq!(TokenState::detect(Some("short"), 50), TokenState::Malformed);
        assert_eq!(TokenState::detect(Some(TOKEN), 50), TokenState::Present);
    }

    #[test]
    fn token_description_names_only_the_variable() {
        let text = TokenState::detect(Some(TOKEN), 50).describe(50);
        assert_eq!(text, "BOTRUNNER_TOKEN is set");
        assert!(!text.contains(TOKEN));
    }

    #[test]
    fn resolved_json_carries_url_and_token_state() {
        let config = BotRunnerConfig::default();
        let resolved = Resolved {
            web_url: config.server.base_url(),
            config: &config,
            token: TokenState::Malformed,
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["web_url"], "http://127.0.0.1:5000");
        assert_eq!(json["token"], "malformed");
        assert_eq!(json["config"]["bot"]["prefix"], "!");
    }

    #[test]
    #[serial_test::serial]
    fn project_layer_comes_last() {
        let [(first, _), (last, path)] = layers();
        assert_eq!(first, "user");
        assert_eq!(last, "project");
        assert!(path.ends_with("config.toml"));
    }
}
