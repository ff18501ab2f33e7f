//! XDG Base Directory paths for placement.
//!
//! The CLI keeps its settings and its default data files under XDG paths
//! on every platform, the same layout tools like gh and kubectl use.

use std::path::PathBuf;

const APP_DIR: &str = "placement";

/// Get the placement config directory.
///
/// Returns `$XDG_CONFIG_HOME/placement` if set, otherwise
/// `~/.config/placement`. The user-level `config.toml` lives here.
///
/// # Examples
///
/// ```
/// use placement_paths::config_dir;
///
/// let settings = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the placement data directory.
///
/// Returns `$XDG_DATA_HOME/placement` if set, otherwise
/// `~/.local/share/placement`. Default assessment and question bank files
/// are looked up here.
///
/// # Examples
///
/// ```
/// use placement_paths::data_dir;
///
/// let bank = data_dir().join("questions.json");
/// ```
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(base) if !base.is_empty() => PathBuf::from(base).join(APP_DIR),
        _ => match dirs::home_dir() {
            Some(home) => home.join(home_relative).join(APP_DIR),
            None => PathBuf::from(home_relative).join(APP_DIR),
        },
    }
}
