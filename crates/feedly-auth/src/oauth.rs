//! OAuth 2.0 authorization-code flow against the Feedly token endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

const AUTHORIZE_PATH: &str = "v3/auth/auth";
const TOKEN_PATH: &str = "v3/auth/token";

/// Build the browser URL that starts the authorization flow.
pub fn build_authorization_url(config: &AuthConfig, redirect_uri: &str) -> Result<Url> {
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("scope", config.scope.as_str()),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let mut url = config.endpoint(AUTHORIZE_PATH)?;
    url.set_query(Some(&query));
    Ok(url)
}

/// Token endpoint response for the code and refresh grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent on refresh responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// Passthrough fields (`id`, `plan`, `provider`, `token_type`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

/// Request/response wrapper around the token endpoint.
///
/// Never touches the session record; callers merge the results.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl TokenExchanger {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use an existing HTTP client (shared connection pool).
    pub fn with_client(config: &AuthConfig, http: reqwest::Client) -> Result<Self> {
        Ok(Self {
            http,
            token_url: config.endpoint(TOKEN_PATH)?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        let request = TokenRequest {
            code: Some(code),
            refresh_token: None,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "authorization_code",
            redirect_uri: Some(redirect_uri),
        };
        let grant: TokenGrant = self.post(&request, "Token exchange").await?;
        tracing::info!("Authorization code exchanged");
        Ok(grant)
    }

    /// Renew the access token with a refresh token.
    pub async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let request = TokenRequest {
            code: None,
            refresh_token: Some(refresh_token),
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "refresh_token",
            redirect_uri: None,
        };
        let grant: TokenGrant = self.post(&request, "Token refresh").await?;
        tracing::info!("Access token refreshed");
        Ok(grant)
    }

    /// Revoke a refresh token. Returns whatever fields the service sends back.
    pub async fn revoke(&self, refresh_token: &str) -> Result<Map<String, Value>> {
        let request = TokenRequest {
            code: None,
            refresh_token: Some(refresh_token),
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "revoke_token",
            redirect_uri: None,
        };
        let body: Value = self.post(&request, "Token revoke").await?;
        tracing::info!("Refresh token revoked");
        Ok(match body {
            Value::Object(fields) => fields,
            _ => Map::new(),
        })
    }

    async fn post<T: DeserializeOwned>(&self, request: &TokenRequest<'_>, what: &str) -> Result<T> {
        let response = self
            .http
            .post(self.token_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Network(format!("{} response unreadable: {}", what, e)))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "{} failed", what);
            return Err(AuthError::Remote {
                status: status.as_u16(),
                body: serde_json::from_str(&text).unwrap_or(Value::String(text)),
            });
        }

        let text = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };
        serde_json::from_str(text).map_err(|e| {
            AuthError::Serialization(format!("Failed to parse {} response: {}", what, e))
        })
    }
}
