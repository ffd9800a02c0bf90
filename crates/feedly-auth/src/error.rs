//! Error types for the auth layer.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while authenticating.
///
/// `Clone` so a single in-flight authorization outcome can be handed to
/// every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Invalid or missing configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// The callback listener could not bind its port.
    #[error("Failed to bind callback listener on {addr}: {message}")]
    Bind { addr: String, message: String },

    /// The callback listener stopped before a redirect arrived.
    #[error("Callback listener closed before receiving a redirect")]
    ListenerClosed,

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// The authorization redirect carried an error (e.g. consent denied).
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The token endpoint returned a non-success status.
    #[error("Remote error ({status}): {body}")]
    Remote {
        status: u16,
        body: serde_json::Value,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Session file could not be written.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.to_string())
    }
}

impl From<feedly_config::ConfigError> for AuthError {
    fn from(e: feedly_config::ConfigError) -> Self {
        AuthError::Config(e.to_string())
    }
}
