//! Configuration file lookup.

use anyhow::{Context, Result};
use palaver_chat_client::ClientConfig;
use std::path::{Path, PathBuf};

/// Name of the configuration file in the user config directory.
const CONFIG_FILE: &str = "palaver.toml";

/// Load the configuration.
///
/// An explicit path must exist. Without one, the default location is used
/// if present and built-in defaults otherwise.
pub fn resolve(explicit: Option<&Path>) -> Result<ClientConfig> {
    if let Some(path) = explicit {
        return ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.exists() => ClientConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        _ => Ok(ClientConfig::default()),
    }
}

/// Get the default configuration path for palaver.
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "palaver", "palaver")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
