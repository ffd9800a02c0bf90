//! Main client implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use feedly_auth::{AuthConfig, BrowserLauncher, SystemBrowser, TokenExchanger, TokenManager};
use feedly_config::FeedlyConfig;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{
    CategoriesApi, EntriesApi, FeedsApi, MarkersApi, PreferencesApi, ProfileApi, SearchApi,
    StreamsApi, SubscriptionsApi, TagsApi,
};
use crate::error::{Error, Result};
use crate::normalize;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefix of every API call.
const API_PREFIX: &str = "v3/";

/// Decoded JSON payload.
pub type Json = serde_json::Value;

/// Feedly API client.
///
/// Every call first obtains a valid access token from the [`TokenManager`]
/// (refreshing or authorizing through the browser when needed), then sends
/// the request with an `Authorization: OAuth <token>` header.
///
/// # Example
///
/// ```no_run
/// use feedly_client::FeedlyClient;
/// use feedly_auth::AuthConfig;
///
/// # async fn example() -> feedly_client::Result<()> {
/// let config = AuthConfig::builder()
///     .client_id("sandbox")
///     .client_secret("secret")
///     .session_file("/home/me/.feedly")
///     .build()?;
/// let client = FeedlyClient::builder(config).build()?;
///
/// let subscriptions = client.subscriptions().list().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FeedlyClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) auth: TokenManager,
}

impl std::fmt::Debug for FeedlyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedlyClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl FeedlyClient {
    /// Create a new client builder.
    pub fn builder(config: AuthConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Build a client from file/env options.
    pub fn from_config(options: &FeedlyConfig) -> Result<Self> {
        let mut builder = Self::builder(AuthConfig::from_options(options)?);
        if let Some(secs) = options.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The session manager behind this client.
    pub fn auth(&self) -> &TokenManager {
        &self.inner.auth
    }

    /// Force a token refresh (or authorization when no refresh token is held).
    pub async fn refresh(&self) -> Result<String> {
        Ok(self.inner.auth.refresh().await?)
    }

    /// Revoke the refresh token and clear credentials from the session.
    pub async fn logout(&self) -> Result<()> {
        Ok(self.inner.auth.logout().await?)
    }

    /// Run an operation and hand its outcome to `callback`.
    ///
    /// For callers that prefer completion callbacks over awaiting results.
    pub async fn with_callback<T, F, C>(operation: F, callback: C)
    where
        F: Future<Output = Result<T>>,
        C: FnOnce(Result<T>),
    {
        callback(operation.await);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the categories API.
    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.clone())
    }

    /// Access the entries API.
    pub fn entries(&self) -> EntriesApi {
        EntriesApi::new(self.clone())
    }

    /// Access the feeds API.
    pub fn feeds(&self) -> FeedsApi {
        FeedsApi::new(self.clone())
    }

    /// Access the markers API (unread counts, read/unread state).
    pub fn markers(&self) -> MarkersApi {
        MarkersApi::new(self.clone())
    }

    /// Access the preferences API.
    pub fn preferences(&self) -> PreferencesApi {
        PreferencesApi::new(self.clone())
    }

    /// Access the profile API.
    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }

    /// Access the search API.
    pub fn search(&self) -> SearchApi {
        SearchApi::new(self.clone())
    }

    /// Access the streams API.
    pub fn streams(&self) -> StreamsApi {
        StreamsApi::new(self.clone())
    }

    /// Access the subscriptions API.
    pub fn subscriptions(&self) -> SubscriptionsApi {
        SubscriptionsApi::new(self.clone())
    }

    /// Access the tags API.
    pub fn tags(&self) -> TagsApi {
        TagsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// The current user's id, authenticating first if needed.
    pub(crate) async fn user_id(&self) -> Result<String> {
        self.inner.auth.access_token().await?;
        self.inner.auth.user_id().await.ok_or(Error::UnknownUser)
    }

    /// Qualify and percent-encode tag names, joined with `,`.
    pub(crate) async fn tag_list<S: AsRef<str>>(&self, tags: &[S]) -> Result<String> {
        let user_id = if tags.iter().all(|t| normalize::is_qualified(t.as_ref())) {
            String::new()
        } else {
            self.user_id().await?
        };
        Ok(tags
            .iter()
            .map(|t| normalize::normalize_tag(t.as_ref(), &user_id))
            .collect::<Vec<_>>()
            .join(","))
    }

    /// Qualify category names (not encoded; they travel in request bodies).
    pub(crate) async fn category_ids<S: AsRef<str>>(&self, categories: &[S]) -> Result<Vec<String>> {
        let user_id = if categories
            .iter()
            .all(|c| normalize::is_qualified(c.as_ref()))
        {
            String::new()
        } else {
            self.user_id().await?
        };
        Ok(categories
            .iter()
            .map(|c| normalize::category_id(c.as_ref(), &user_id))
            .collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner
            .base_url
            .join(&format!("{}{}", API_PREFIX, path))
            .map_err(Error::from)
    }

    /// Make a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, |r| r).await
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(Method::GET, path, |r| r.query(query)).await
    }

    /// Make a POST request.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, |r| r.json(body)).await
    }

    /// Make a PUT request.
    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, path, |r| r.json(body)).await
    }

    /// Make a DELETE request.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::DELETE, path, |r| r).await
    }

    /// Resolve a token, attach it, send, and decode the response.
    async fn send<T, F>(&self, method: Method, path: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path)?;
        let token = self.inner.auth.access_token().await?;
        let mut auth = HeaderValue::from_str(&format!("OAuth {}", token))
            .map_err(|_| Error::Auth(feedly_auth::AuthError::Config("Invalid access token".into())))?;
        auth.set_sensitive(true);

        tracing::debug!(method = %method, path = %url.path(), "Feedly API request");
        let request = self
            .inner
            .http
            .request(method, url)
            .header(AUTHORIZATION, auth)
            .timeout(self.inner.timeout);
        let response = build(request).send().await?;
        self.handle_response(response).await
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            Ok(serde_json::from_value(Json::Null)?)
        } else {
            Ok(serde_json::from_slice(&bytes)?)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Json>(&text).unwrap_or(Json::String(text));

        let message = body
            .get("errorMessage")
            .and_then(Json::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));

        tracing::debug!(status, message = %message, "Feedly API error");
        Error::Api {
            status,
            message,
            body,
        }
    }
}

/// Builder for creating a FeedlyClient.
#[derive(Debug)]
pub struct ClientBuilder {
    config: AuthConfig,
    timeout: Duration,
    user_agent: Option<String>,
    browser: Option<Arc<dyn BrowserLauncher>>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            browser: None,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Open the authorization URL with a custom launcher.
    pub fn browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<FeedlyClient> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("feedly-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder().user_agent(user_agent).build()?;

        let exchanger = TokenExchanger::with_client(&self.config, http.clone())?;
        let browser = self.browser.unwrap_or_else(|| Arc::new(SystemBrowser));
        let base_url = self.config.base.clone();
        let auth = TokenManager::from_parts(self.config, exchanger, browser);

        Ok(FeedlyClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                auth,
            }),
        })
    }
}
