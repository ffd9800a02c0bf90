//! Config file discovery.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/feedly/config.toml` (XDG user config, or `FEEDLY_CONFIG_DIR`)
//! 2. An explicit file passed by the caller
//! 3. `FEEDLY_CLIENT_ID` / `FEEDLY_CLIENT_SECRET` environment variables

use std::path::{Path, PathBuf};

use crate::{ConfigError, FeedlyConfig, Result, expand_tilde};

/// Default config filename within the config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "feedly";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "FEEDLY_CONFIG_DIR";

const CLIENT_ID_ENV: &str = "FEEDLY_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "FEEDLY_CLIENT_SECRET";

/// Conventional session file location (`~/.feedly`).
pub fn default_session_path() -> PathBuf {
    expand_tilde("~/.feedly")
}

/// Get the XDG config file path for feedly.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the XDG config directory for feedly.
///
/// Checks `FEEDLY_CONFIG_DIR` env var first, then falls back to platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<FeedlyConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    FeedlyConfig::from_toml(&contents)
}

/// Load configuration by layering the user config, an optional explicit
/// file, and environment overrides.
///
/// A missing user config is not an error; a missing explicit file is.
pub fn load_config(explicit: Option<&Path>) -> Result<FeedlyConfig> {
    let mut config = FeedlyConfig::new();

    if let Some(path) = xdg_config_path()
        && path.is_file()
    {
        config.merge(load_config_file(&path)?);
    }

    if let Some(path) = explicit {
        config.merge(load_config_file(path)?);
    }

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply `FEEDLY_CLIENT_ID` / `FEEDLY_CLIENT_SECRET` on top of `config`.
pub fn apply_env_overrides(config: &mut FeedlyConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut FeedlyConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(id) = lookup(CLIENT_ID_ENV).filter(|v| !v.is_empty()) {
        config.client_id = Some(id);
    }
    if let Some(secret) = lookup(CLIENT_SECRET_ENV).filter(|v| !v.is_empty()) {
        config.client_secret = Some(secret);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
