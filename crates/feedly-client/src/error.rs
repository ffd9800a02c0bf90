//! Client error types.

use feedly_auth::AuthError;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading the options file failed.
    #[error("Configuration error: {0}")]
    Config(#[from] feedly_config::ConfigError),

    /// Obtaining an access token failed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `errorMessage` from the payload, or the status line.
        message: String,
        /// Raw error payload.
        body: serde_json::Value,
    },

    /// A required call argument was missing or empty.
    #[error("{0} required")]
    MissingArgument(&'static str),

    /// The session has no user id to qualify tag/category names with.
    #[error("Session has no user id; authenticate first")]
    UnknownUser,
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_)) || matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
