//! Configuration file location

use std::path::PathBuf;

/// Directory name under the platform configuration root
const APP_NAME: &str = "peer-attr-check";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/peer-attr-check/`
/// - macOS: `~/Library/Application Support/peer-attr-check/`
/// - Windows: `%APPDATA%\peer-attr-check\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the default configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
