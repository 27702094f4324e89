//! Configuration loading from `~/.actorbridge/config.toml` with defaults.

use actorbridge_types::config::BridgeConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load bridge configuration from a TOML file, with defaults.
///
/// A missing, unreadable or unparsable file yields [`BridgeConfig::default`].
pub fn load_config(path: Option<&Path>) -> BridgeConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<BridgeConfig>(&contents) {
                Ok(config) => {
                    info!(path = %config_path.display(), "Loaded configuration");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %config_path.display(),
                        "Failed to parse config, using defaults"
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to read config file, using defaults"
                );
            }
        }
    } else {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
    }

    BridgeConfig::default()
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    actorbridge_home().join("config.toml")
}

/// Get the actorbridge home directory.
pub fn actorbridge_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".actorbridge")
}
