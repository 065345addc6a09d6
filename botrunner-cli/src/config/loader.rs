use super::types::{
    BotConfig, BotRunnerConfig, DiscordSection, RawBotConfig, RawBotRunnerConfig,
    RawDiscordConfig, RawServerConfig, ServerConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Overrides the project config directory (useful for isolated tests)
pub const PROJECT_CONFIG_DIR_ENV: &str = "BOTRUNNER_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (defaults, then user, then project)
    pub fn load() -> Result<BotRunnerConfig> {
        Self::load_from(Some(&Self::user_config_path()), &Self::project_config_path())
    }

    /// Load and merge the given files; missing files are skipped
    pub fn load_from(user: Option<&Path>, project: &Path) -> Result<BotRunnerConfig> {
        let mut raw = RawBotRunnerConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && let Some(user_config) = Self::read_raw(user_path)?
        {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (`$XDG_CONFIG_HOME/botrunner/config.toml`)
    pub fn user_config_path() -> PathBuf {
        botrunner_paths::user_config_file()
    }

    /// Get project config path
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join(botrunner_paths::CONFIG_FILE)
        } else {
            PathBuf::from(".botrunner").join(botrunner_paths::CONFIG_FILE)
        }
    }

    fn read_raw(path: &Path) -> Result<Option<RawBotRunnerConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawBotRunnerConfig, overlay: RawBotRunnerConfig) -> RawBotRunnerConfig {
        RawBotRunnerConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            bot: RawBotConfig {
                prefix: overlay.bot.prefix.or(base.bot.prefix),
                min_token_length: overlay.bot.min_token_length.or(base.bot.min_token_length),
                start_probe_ms: overlay.bot.start_probe_ms.or(base.bot.start_probe_ms),
                stop_timeout_ms: overlay.bot.stop_timeout_ms.or(base.bot.stop_timeout_ms),
            },
            discord: RawDiscordConfig {
                gateway_url: overlay.discord.gateway_url.or(base.discord.gateway_url),
                api_base: overlay.discord.api_base.or(base.discord.api_base),
                handshake_timeout_ms: overlay
                    .discord
                    .handshake_timeout_ms
                    .or(base.discord.handshake_timeout_ms),
                guild_ready_timeout_ms: overlay
                    .discord
                    .guild_ready_timeout_ms
                    .or(base.discord.guild_ready_timeout_ms),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawBotRunnerConfig) -> BotRunnerConfig {
        let server = ServerConfig::default();
        let bot = BotConfig::default();
        let discord = DiscordSection::default();

        BotRunnerConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or(server.host),
                port: raw.server.port.unwrap_or(server.port),
            },
            bot: BotConfig {
                prefix: raw.bot.prefix.unwrap_or(bot.prefix),
                min_token_length: raw.bot.min_token_length.unwrap_or(bot.min_token_length),
                start_probe_ms: raw.bot.start_probe_ms.unwrap_or(bot.start_probe_ms),
                stop_timeout_ms: raw.bot.stop_timeout_ms.unwrap_or(bot.stop_timeout_ms),
            },
            discord: DiscordSection {
                gateway_url: raw.discord.gateway_url.unwrap_or(discord.gateway_url),
                api_base: raw.discord.api_base.unwrap_or(discord.api_base),
                handshake_timeout_ms: raw
                    .discord
                    .handshake_timeout_ms
                    .unwrap_or(discord.handshake_timeout_ms),
                guild_ready_timeout_ms: raw
                    .discord
                    .guild_ready_timeout_ms
                    .unwrap_or(discord.guild_ready_timeout_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from(
            Some(&temp_dir.path().join("user.toml")),
            &temp_dir.path().join("project.toml"),
        )
        .unwrap();
        assert_eq!(config, BotRunnerConfig::default());
    }

    #[test]
    fn test_project_overrides_user() {
        let temp_dir = TempDir::new().unwrap();
        let user = write_file(
            &temp_dir,
            "user.toml",
            r#"
[server]
host = "0.0.0.0"
port = 8000

[bot]
prefix = "?"
"#,
        );
        let project = write_file(
            &temp_dir,
            "project.toml",
            r#"
[server]
port = 9000

[discord]
api_base = "http://127.0.0.1:3000/api"
"#,
        );

        let config = ConfigLoader::load_from(Some(&user), &project).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.bot.prefix, "?");
        assert_eq!(config.discord.api_base, "http://127.0.0.1:3000/api");
        // Untouched keys keep their defaults
        assert_eq!(config.bot.stop_timeout_ms, 5000);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let project = write_file(&temp_dir, "project.toml", "[server\nport = nope");

        let err = ConfigLoader::load_from(None, &project).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }

    #[test]
    fn test_merge_raw_none_preserves_base() {
        let base = RawBotRunnerConfig {
            bot: RawBotConfig {
                prefix: Some("$".to_string()),
                start_probe_ms: Some(100),
                ..RawBotConfig::default()
            },
            ..RawBotRunnerConfig::default()
        };

        let merged = ConfigLoader::merge_raw(base, RawBotRunnerConfig::default());
        assert_eq!(merged.bot.prefix.as_deref(), Some("$"));
        assert_eq!(merged.bot.start_probe_ms, Some(100));
        assert!(merged.server.port.is_none());
    }

    #[test]
    fn test_user_config_path_is_under_app_dir() {
        let path = ConfigLoader::user_config_path();
        assert!(path.to_string_lossy().contains("botrunner"));
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_path_default() {
        let previous = std::env::var(PROJECT_CONFIG_DIR_ENV).ok();
        unsafe {
            std::env::remove_var(PROJECT_CONFIG_DIR_ENV);
        }
        let path = ConfigLoader::project_config_path();
        if let Some(value) = previous {
            unsafe {
                std::env::set_var(PROJECT_CONFIG_DIR_ENV, value);
            }
        }
        assert_eq!(path, PathBuf::from(".botrunner/config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_dir_env_override() {
        let temp_dir = TempDir::new().unwrap();
        write_file(&temp_dir, "config.toml", "[server]\nport = 6123\n");

        unsafe {
            std::env::set_var(PROJECT_CONFIG_DIR_ENV, temp_dir.path());
        }
        let path = ConfigLoader::project_config_path();
        let config = ConfigLoader::load_from(None, &path).unwrap();
        unsafe {
            std::env::remove_var(PROJECT_CONFIG_DIR_ENV);
        }

        assert_eq!(path, temp_dir.path().join("config.toml"));
        assert_eq!(config.server.port, 6123);
    }
}
