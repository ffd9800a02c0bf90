//! Runtime configuration for the auth layer.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use feedly_config::FeedlyConfig;
use url::Url;

use crate::error::{AuthError, Result};

/// Default API base URL.
pub const DEFAULT_BASE: &str = "http://cloud.feedly.com";

/// Default OAuth scope.
pub const DEFAULT_SCOPE: &str = "https://cloud.feedly.com/subscriptions";

/// Page served to the browser when no HTML is configured.
pub const DEFAULT_HTML_TEXT: &str = "No HTML found";

/// Refresh lead time before expiry (1 hour).
pub const DEFAULT_SLOP: Duration = Duration::from_secs(60 * 60);

/// Validated auth configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Callback listener port (0 = OS-assigned).
    pub port: u16,
    /// API base URL, always ending in `/`.
    pub base: Url,
    /// Session persistence path; `None` keeps the session in memory.
    pub session_file: Option<PathBuf>,
    /// Callback page file, read once at startup.
    pub html_file: Option<PathBuf>,
    /// Callback page text, used when `html_file` is unset or unreadable.
    pub html_text: String,
    /// Lead time before expiry at which the token is refreshed.
    pub slop: Duration,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl AuthConfig {
    /// Start building a config.
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Build from file/env options, applying defaults.
    pub fn from_options(options: &FeedlyConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .client_id(options.require_client_id()?)
            .client_secret(options.require_client_secret()?);

        if let Some(port) = options.port {
            builder = builder.port(port);
        }
        if let Some(base) = &options.base {
            builder = builder.base(base);
        }
        if let Some(path) = options.session_path() {
            builder = builder.session_file(path);
        }
        if let Some(path) = options.html_path() {
            builder = builder.html_file(path);
        }
        if let Some(text) = &options.html_text {
            builder = builder.html_text(text);
        }
        if let Some(slop) = options.slop {
            builder = builder.slop(Duration::from_millis(slop));
        }
        if let Some(scope) = &options.scope {
            builder = builder.scope(scope);
        }
        builder.build()
    }

    /// Build a URL under the API base, e.g. `v3/auth/token`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AuthError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("port", &self.port)
            .field("base", &self.base.as_str())
            .field("session_file", &self.session_file)
            .field("html_file", &self.html_file)
            .field("slop", &self.slop)
            .field("client_id", &self.client_id)
            .field("client_secret", &"********")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Builder for [`AuthConfig`].
#[derive(Debug, Default)]
pub struct AuthConfigBuilder {
    port: u16,
    base: Option<String>,
    session_file: Option<PathBuf>,
    html_file: Option<PathBuf>,
    html_text: Option<String>,
    slop: Option<Duration>,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: Option<String>,
}

impl AuthConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Persist the session to this file.
    pub fn session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    pub fn html_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.html_file = Some(path.into());
        self
    }

    pub fn html_text(mut self, text: impl Into<String>) -> Self {
        self.html_text = Some(text.into());
        self
    }

    pub fn slop(mut self, slop: Duration) -> Self {
        self.slop = Some(slop);
        self
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Validate and build. Client id and secret are required.
    pub fn build(self) -> Result<AuthConfig> {
        let client_id = self
            .client_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::Config("client_id and client_secret required".into()))?;
        let client_secret = self
            .client_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::Config("client_id and client_secret required".into()))?;

        let base = self.base.unwrap_or_else(|| DEFAULT_BASE.to_string());
        let mut base = Url::parse(&base)
            .map_err(|e| AuthError::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(AuthConfig {
            port: self.port,
            base,
            session_file: self.session_file,
            html_file: self.html_file,
            html_text: self
                .html_text
                .unwrap_or_else(|| DEFAULT_HTML_TEXT.to_string()),
            slop: self.slop.unwrap_or(DEFAULT_SLOP),
            client_id,
            client_secret,
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_credentials() {
        let err = AuthConfig::builder().client_id("id").build().unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));

        let err = AuthConfig::builder().client_secret("s").build().unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let config = AuthConfig::builder()
            .client_id("id")
            .client_secret("secret")
            .build()
            .unwrap();

        assert_eq!(config.port, 0);
        assert_eq!(config.base.as_str(), "http://cloud.feedly.com/");
        assert_eq!(config.slop, DEFAULT_SLOP);
        assert_eq!(config.html_text, DEFAULT_HTML_TEXT);
        assert_eq!(config.scope, DEFAULT_SCOPE);
        assert!(config.session_file.is_none());
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let config = AuthConfig::builder()
            .client_id("id")
            .client_secret("secret")
            .base("http://localhost:9000/proxy")
            .build()
            .unwrap();

        let url = config.endpoint("/v3/auth/token").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/proxy/v3/auth/token");
    }

    #[test]
    fn test_from_options() {
        let options = FeedlyConfig {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            slop: Some(1500),
            port: Some(4242),
            config_file: Some("/tmp/session.json".into()),
            ..Default::default()
        };
        let config = AuthConfig::from_options(&options).unwrap();
        assert_eq!(config.slop, Duration::from_millis(1500));
        assert_eq!(config.port, 4242);
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/session.json")));
    }

    #[test]
    fn test_from_options_missing_secret() {
        let options = FeedlyConfig {
            client_id: Some("id".into()),
            ..Default::default()
        };
        assert!(matches!(
            AuthConfig::from_options(&options),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = AuthConfig::builder()
            .client_id("id")
            .client_secret("hunter2")
            .build()
            .unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
