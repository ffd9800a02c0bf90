//! Configuration types.
//!
//! Every option is optional in the file; defaults are applied by the auth
//! layer when it builds its runtime config.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Client options, as read from `config.toml`.
///
/// ```toml
/// client_id = "sandbox"
/// client_secret = "..."
/// base = "https://sandbox7.feedly.com"
/// config_file = "~/.feedly"
/// port = 0
/// slop = 3600000
/// ```
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedlyConfig {
    /// Local callback listener port (0 = OS-assigned).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Session persistence path. Omit to keep the session in memory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    /// HTML page served to the browser after the OAuth redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_file: Option<String>,
    /// Inline page text, used when `html_file` is unset or unreadable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_text: Option<String>,
    /// Milliseconds before expiry at which the token is refreshed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slop: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// OAuth scope requested during authorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Timeout for REST calls, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl FeedlyConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: FeedlyConfig) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            port,
            base,
            config_file,
            html_file,
            html_text,
            slop,
            client_id,
            client_secret,
            scope,
            timeout_secs
        );
    }

    /// Client id, or a `MissingField` error.
    pub fn require_client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing("client_id"))
    }

    /// Client secret, or a `MissingField` error.
    pub fn require_client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| missing("client_secret"))
    }

    /// Session file path with `~` expanded.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.config_file.as_deref().map(expand_tilde)
    }

    /// HTML page path with `~` expanded.
    pub fn html_path(&self) -> Option<PathBuf> {
        self.html_file.as_deref().map(expand_tilde)
    }
}

impl fmt::Debug for FeedlyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedlyConfig")
            .field("port", &self.port)
            .field("base", &self.base)
            .field("config_file", &self.config_file)
            .field("html_file", &self.html_file)
            .field("html_text", &self.html_text.as_ref().map(|t| t.len()))
            .field("slop", &self.slop)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "********"),
            )
            .field("scope", &self.scope)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingField {
        field: field.to_string(),
        context: "feedly config".to_string(),
    }
}

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or with `~user` syntax, are returned as-is.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => Path::new(path).to_path_buf(),
    }
}
