//! XDG Base Directory paths for botrunner.
//!
//! The CLI resolves its user configuration through XDG paths on every
//! platform rather than platform-native locations.

use std::path::PathBuf;

/// Application directory name under the XDG base directories.
pub const APP_DIR: &str = "botrunner";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Get the botrunner config directory.
///
/// Returns `$XDG_CONFIG_HOME/botrunner` if set, otherwise `~/.config/botrunner`.
///
/// # Examples
///
/// ```
/// use botrunner_paths::config_dir;
///
/// let config = config_dir();
/// assert!(config.ends_with("botrunner"));
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join(APP_DIR)
    } else {
        PathBuf::from(".config").join(APP_DIR)
    }
}

/// Path of the user-level configuration file.
pub fn user_config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}
