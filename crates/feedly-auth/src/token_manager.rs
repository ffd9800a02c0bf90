//! Session lifecycle: decides per call whether the current token can be
//! used, must be refreshed, or requires a fresh browser authorization.
//!
//! At most one authorization/refresh flow runs at a time. Callers that need
//! one while it is in flight attach to the same shared future and observe
//! the same outcome. The flow lives only as long as someone awaits it:
//! once every caller has given up (a timeout, a dropped task), the flow is
//! dropped and its redirect listener shut down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use serde_json::Map;
use tokio::sync::{Mutex, OnceCell, RwLock};

use crate::browser::{BrowserLauncher, SystemBrowser};
use crate::callback::CallbackListener;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::oauth::{TokenExchanger, TokenGrant, build_authorization_url};
use crate::session::{SessionRecord, SessionStore, TokenState};

type PendingFlow = Shared<BoxFuture<'static, Result<String>>>;

/// The in-flight flow, tagged so a finished flow only clears its own slot.
struct PendingSlot {
    id: u64,
    flow: WeakShared<BoxFuture<'static, Result<String>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Authorize,
    Refresh,
}

/// Owns the session record and every transition of it.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: AuthConfig,
    store: SessionStore,
    exchanger: TokenExchanger,
    browser: Arc<dyn BrowserLauncher>,
    session: RwLock<SessionRecord>,
    /// Callback page text, set once the session has been loaded.
    boot: OnceCell<String>,
    pending: parking_lot::Mutex<Option<PendingSlot>>,
    next_flow: AtomicU64,
    /// Held for the whole of every session transition (flow or logout).
    transition: Mutex<()>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .field("browser", &self.inner.browser)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Manager that opens the system browser for authorization.
    pub fn new(config: AuthConfig) -> Result<Self> {
        Self::with_browser(config, Arc::new(SystemBrowser))
    }

    /// Manager with a custom browser launcher.
    pub fn with_browser(config: AuthConfig, browser: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let exchanger = TokenExchanger::new(&config)?;
        Ok(Self::from_parts(config, exchanger, browser))
    }

    /// Manager from pre-built parts (shared HTTP client, test doubles).
    pub fn from_parts(
        config: AuthConfig,
        exchanger: TokenExchanger,
        browser: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: SessionStore::new(config.session_file.clone()),
                config,
                exchanger,
                browser,
                session: RwLock::new(SessionRecord::default()),
                boot: OnceCell::new(),
                pending: parking_lot::Mutex::new(None),
                next_flow: AtomicU64::new(0),
                transition: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    /// Wait for the persisted session and callback page to be loaded.
    pub async fn ready(&self) {
        self.inner.ready().await;
    }

    /// A valid access token, refreshing or authorizing first if needed.
    pub async fn access_token(&self) -> Result<String> {
        self.inner.ready().await;
        let state = self
            .inner
            .session
            .read()
            .await
            .token_state(Utc::now(), self.inner.config.slop);

        match state {
            TokenState::Fresh(token) => Ok(token),
            TokenState::Expiring => {
                tracing::debug!("Access token expiring, refreshing");
                self.run(Flow::Refresh, true).await
            }
            TokenState::Missing => {
                tracing::debug!("No valid access token, authorizing");
                self.run(Flow::Authorize, true).await
            }
        }
    }

    /// Force a new token regardless of freshness: refresh when a refresh
    /// token is held, otherwise authorize.
    pub async fn refresh(&self) -> Result<String> {
        self.inner.ready().await;
        let flow = if self.inner.session.read().await.refresh_token.is_some() {
            Flow::Refresh
        } else {
            Flow::Authorize
        };
        self.run(flow, false).await
    }

    /// Revoke the refresh token and strip credentials from the session.
    ///
    /// Waits for an in-flight authorization or refresh to finish first, so
    /// its result cannot land after the credentials are cleared.
    pub async fn logout(&self) -> Result<()> {
        self.inner.ready().await;
        let _transition = self.inner.transition.lock().await;
        let refresh_token = self.inner.session.read().await.refresh_token.clone();

        let returned = match refresh_token {
            Some(token) => self.inner.exchanger.revoke(&token).await?,
            None => {
                tracing::debug!("No refresh token held, clearing local session only");
                Map::new()
            }
        };

        let snapshot = {
            let mut session = self.inner.session.write().await;
            session.clear_credentials();
            session.merge_fields(returned);
            session.clone()
        };
        self.inner.store.save(&snapshot).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// A copy of the current session record.
    pub async fn session(&self) -> SessionRecord {
        self.inner.ready().await;
        self.inner.session.read().await.clone()
    }

    /// The Feedly user id from the session, if known.
    pub async fn user_id(&self) -> Option<String> {
        self.inner.ready().await;
        self.inner.session.read().await.user_id.clone()
    }

    /// Join the in-flight flow, or start `flow` if none is running.
    async fn run(&self, flow: Flow, recheck: bool) -> Result<String> {
        let pending = {
            let mut slot = self.inner.pending.lock();
            let joined = slot.as_ref().and_then(|p| p.flow.upgrade());
            match joined {
                Some(pending) => {
                    tracing::debug!("Joining in-flight auth flow");
                    pending
                }
                None => {
                    let id = self.inner.next_flow.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(flow_id = id, ?flow, "Starting auth flow");
                    let inner = Arc::clone(&self.inner);
                    let pending: PendingFlow = async move {
                        let _clear = ClearPending { inner: &inner, id };
                        inner.drive(flow, recheck).await
                    }
                    .boxed()
                    .shared();
                    *slot = pending
                        .downgrade()
                        .map(|flow| PendingSlot { id, flow });
                    pending
                }
            }
        };
        pending.await
    }

    /// Whether an authorization or refresh flow is currently registered.
    pub fn is_pending(&self) -> bool {
        let flow = self.inner.pending.lock().as_ref().map(|p| p.flow.clone());
        flow.and_then(|flow| flow.upgrade()).is_some()
    }
}

/// Empties the pending slot when its flow finishes, fails, unwinds or is
/// dropped by its last waiter.
struct ClearPending<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for ClearPending<'_> {
    fn drop(&mut self) {
        let mut slot = self.inner.pending.lock();
        if slot.as_ref().is_some_and(|p| p.id == self.id) {
            slot.take();
        }
    }
}

impl Inner {
    async fn ready(&self) -> &str {
        self.boot
            .get_or_init(|| async {
                let record = self.store.load().await;
                *self.session.write().await = record;
                self.load_page().await
            })
            .await
    }

    async fn load_page(&self) -> String {
        let Some(path) = &self.config.html_file else {
            return self.config.html_text.clone();
        };
        match tokio::fs::read_to_string(path).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Callback page unreadable, using inline text");
                self.config.html_text.clone()
            }
        }
    }

    async fn drive(&self, flow: Flow, recheck: bool) -> Result<String> {
        let _transition = self.transition.lock().await;
        if recheck
            && let TokenState::Fresh(token) = self
                .session
                .read()
                .await
                .token_state(Utc::now(), self.config.slop)
        {
            return Ok(token);
        }

        let grant = match flow {
            Flow::Authorize => self.authorize().await?,
            Flow::Refresh => {
                let refresh_token = self
                    .session
                    .read()
                    .await
                    .refresh_token
                    .clone()
                    .ok_or_else(|| AuthError::Config("No refresh token held".to_string()))?;
                self.exchanger.exchange_refresh_token(&refresh_token).await?
            }
        };
        self.commit(grant).await
    }

    async fn authorize(&self) -> Result<TokenGrant> {
        let page = self.ready().await.to_string();
        let mut listener = CallbackListener::bind(self.config.port, page).await?;
        let redirect_uri = listener.callback_url().to_string();
        let url = build_authorization_url(&self.config, &redirect_uri)?;

        tracing::info!(redirect_uri = %redirect_uri, "Opening browser for authorization");
        if let Err(e) = self.browser.open(url.as_str()) {
            tracing::warn!(error = %e, url = %url, "Could not open browser; open the URL manually");
        }

        let callback = listener.wait().await?;
        if let Some(error) = callback.error() {
            return Err(AuthError::Authorization(error.to_string()));
        }
        let code = callback
            .code()
            .ok_or_else(|| AuthError::Authorization("Redirect carried no code".to_string()))?;

        self.exchanger.exchange_code(code, &redirect_uri).await
    }

    /// Merge the grant, persist, and return the new access token.
    async fn commit(&self, grant: TokenGrant) -> Result<String> {
        let token = grant.access_token.clone();
        let snapshot = {
            let mut session = self.session.write().await;
            session.apply_grant(grant, Utc::now())?;
            session.clone()
        };
        if let Err(e) = self.store.save(&snapshot).await {
            tracing::warn!(error = %e, "Failed to persist session");
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use std::sync::atomic::AtomicBool;

    use futures::future::join_all;
    use serde_json::json;
    use tempfile::tempdir;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Stands in for the browser: records each URL and follows the redirect
    /// with the configured query string.
    #[derive(Debug)]
    struct ScriptedBrowser {
        redirect_query: String,
        opened: parking_lot::Mutex<Vec<String>>,
    }

    impl ScriptedBrowser {
        fn new(redirect_query: &str) -> Arc<Self> {
            Arc::new(Self {
                redirect_query: redirect_query.to_string(),
                opened: parking_lot::Mutex::new(Vec::new()),
            })
        }

        fn opened(&self) -> Vec<String> {
            self.opened.lock().clone()
        }
    }

    impl BrowserLauncher for ScriptedBrowser {
        fn open(&self, url: &str) -> std::io::Result<()> {
            self.opened.lock().push(url.to_string());
            let redirect = Url::parse(url)
                .ok()
                .and_then(|u| {
                    u.query_pairs()
                        .find(|(k, _)| k == "redirect_uri")
                        .map(|(_, v)| v.into_owned())
                })
                .expect("redirect_uri in authorization URL")
                .replace("localhost", "127.0.0.1");
            let target = format!("{}?{}", redirect, self.redirect_query);
            tokio::spawn(async move {
                let _ = reqwest::get(target).await;
            });
            Ok(())
        }
    }

    /// Records the authorization URL and never completes the redirect.
    #[derive(Debug, Default)]
    struct IdleBrowser {
        opened: parking_lot::Mutex<Vec<String>>,
    }

    impl BrowserLauncher for IdleBrowser {
        fn open(&self, url: &str) -> std::io::Result<()> {
            self.opened.lock().push(url.to_string());
            Ok(())
        }
    }

    /// Crashes on the first launch, then behaves like its inner browser.
    #[derive(Debug)]
    struct CrashOnce {
        crashed: AtomicBool,
        inner: Arc<ScriptedBrowser>,
    }

    impl BrowserLauncher for CrashOnce {
        fn open(&self, url: &str) -> std::io::Result<()> {
            if !self.crashed.swap(true, Ordering::SeqCst) {
                panic!("browser crashed");
            }
            self.inner.open(url)
        }
    }

    /// Local address behind the `redirect_uri` of an authorization URL.
    fn redirect_addr(authorization_url: &str) -> String {
        let url = Url::parse(authorization_url).unwrap();
        let redirect = url
            .query_pairs()
            .find(|(k, _)| k == "redirect_uri")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let port = Url::parse(&redirect).unwrap().port().unwrap();
        format!("127.0.0.1:{}", port)
    }

    fn config(server: &MockServer, session_file: Option<std::path::PathBuf>) -> AuthConfig {
        let mut builder = AuthConfig::builder()
            .client_id("sandbox")
            .client_secret("secret")
            .base(server.uri())
            .html_text("<p>close me</p>")
            .slop(Duration::from_secs(3600));
        if let Some(path) = session_file {
            builder = builder.session_file(path);
        }
        builder.build().unwrap()
    }

    fn seeded(expires_in: chrono::Duration) -> SessionRecord {
        SessionRecord {
            access_token: Some("old-access".into()),
            refresh_token: Some("old-refresh".into()),
            expires_at: Some(Utc::now() + expires_in),
            user_id: Some("u-1".into()),
            extra: Map::new(),
        }
    }

    async fn seed(path: &std::path::Path, record: &SessionRecord) {
        SessionStore::new(Some(path.to_path_buf()))
            .save(record)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fresh_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        seed(&file, &seeded(chrono::Duration::hours(5))).await;

        let browser = ScriptedBrowser::new("code=never");
        let manager = TokenManager::with_browser(config(&server, Some(file)), browser.clone())
            .unwrap();

        assert_eq!(manager.access_token().await.unwrap(), "old-access");
        assert!(browser.opened().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .and(body_partial_json(json!({
                "refresh_token": "old-refresh",
                "grant_type": "refresh_token",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "new-access", "expires_in": 7200 }))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        seed(&file, &seeded(chrono::Duration::minutes(10))).await;

        let browser = ScriptedBrowser::new("code=never");
        let manager =
            TokenManager::with_browser(config(&server, Some(file.clone())), browser.clone())
                .unwrap();

        let calls = (0..5).map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.access_token().await })
        });
        let tokens: Vec<String> = join_all(calls)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert!(tokens.iter().all(|t| t == "new-access"));
        assert!(browser.opened().is_empty());

        let persisted = SessionStore::new(Some(file)).load().await;
        assert_eq!(persisted.access_token.as_deref(), Some("new-access"));
        assert_eq!(persisted.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_authorization_flow_from_empty_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .and(body_partial_json(json!({
                "code": "ABC",
                "client_id": "sandbox",
                "grant_type": "authorization_code",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-access",
                "refresh_token": "fresh-refresh",
                "expires_in": 3600,
                "id": "u-9",
                "plan": "standard",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        let browser = ScriptedBrowser::new("code=ABC");
        let manager = TokenManager::with_browser(
            config(&server, Some(file.clone())),
            browser.clone(),
        )
        .unwrap();

        let before = Utc::now();
        let token = manager.access_token().await.unwrap();
        assert_eq!(token, "fresh-access");

        let opened = browser.opened();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains("/v3/auth/auth?response_type=code&client_id=sandbox&redirect_uri=http%3A%2F%2Flocalhost%3A"));
        assert!(opened[0].contains("&scope="));

        let persisted = SessionStore::new(Some(file)).load().await;
        assert_eq!(persisted.user_id.as_deref(), Some("u-9"));
        let expires = persisted.expires_at.unwrap();
        assert!(expires >= before + chrono::Duration::seconds(3600));
        assert!(expires <= Utc::now() + chrono::Duration::seconds(3600));
    }

    #[tokio::test]
    async fn test_concurrent_authorization_opens_one_browser() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-access",
                "refresh_token": "fresh-refresh",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let browser = ScriptedBrowser::new("code=ABC");
        let manager = TokenManager::with_browser(config(&server, None), browser.clone()).unwrap();

        let calls = (0..4).map(|_| {
            let manager = manager.clone();
            async move { manager.access_token().await }
        });
        let tokens = join_all(calls).await;

        assert!(tokens.iter().all(|t| matches!(t.as_deref(), Ok("fresh-access"))));
        assert_eq!(browser.opened().len(), 1);
    }

    #[tokio::test]
    async fn test_denied_authorization_leaves_session_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let browser = ScriptedBrowser::new("error=access_denied");
        let manager = TokenManager::with_browser(config(&server, None), browser).unwrap();

        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Authorization(ref e) if e == "access_denied"));
        assert_eq!(manager.session().await, SessionRecord::default());
    }

    #[tokio::test]
    async fn test_failed_refresh_does_not_fall_back_to_browser() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "errorMessage": "revoked" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        seed(&file, &seeded(chrono::Duration::minutes(1))).await;

        let browser = ScriptedBrowser::new("code=ABC");
        let manager =
            TokenManager::with_browser(config(&server, Some(file)), browser.clone()).unwrap();

        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Remote { status: 401, .. }));
        assert!(browser.opened().is_empty());
    }

    #[tokio::test]
    async fn test_forced_refresh_ignores_freshness() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .and(body_partial_json(json!({ "grant_type": "refresh_token" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "forced", "expires_in": 36000 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        seed(&file, &seeded(chrono::Duration::hours(10))).await;

        let browser = ScriptedBrowser::new("code=ABC");
        let manager =
            TokenManager::with_browser(config(&server, Some(file)), browser).unwrap();

        assert_eq!(manager.refresh().await.unwrap(), "forced");
        assert_eq!(manager.access_token().await.unwrap(), "forced");
    }

    #[tokio::test]
    async fn test_logout_preserves_unrelated_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .and(body_partial_json(json!({
                "refresh_token": "old-refresh",
                "grant_type": "revoke_token",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "revoked": true })))
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        let mut record = seeded(chrono::Duration::hours(2));
        record.extra.insert("plan".into(), json!("pro"));
        record.extra.insert("client".into(), json!("feedly"));
        seed(&file, &record).await;

        let browser = ScriptedBrowser::new("code=ABC");
        let manager =
            TokenManager::with_browser(config(&server, Some(file.clone())), browser).unwrap();

        manager.logout().await.unwrap();

        let persisted = SessionStore::new(Some(file)).load().await;
        assert!(persisted.access_token.is_none());
        assert!(persisted.refresh_token.is_none());
        assert!(persisted.expires_at.is_none());
        assert!(!persisted.extra.contains_key("plan"));
        assert_eq!(persisted.user_id.as_deref(), Some("u-1"));
        assert_eq!(persisted.extra.get("client"), Some(&json!("feedly")));
        assert_eq!(persisted.extra.get("revoked"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_html_file_is_served() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let page = temp.path().join("index.html");
        std::fs::write(&page, "<h1>from file</h1>").unwrap();

        let config = AuthConfig::builder()
            .client_id("sandbox")
            .client_secret("secret")
            .base(server.uri())
            .html_file(&page)
            .build()
            .unwrap();
        let manager =
            TokenManager::with_browser(config, ScriptedBrowser::new("code=ABC")).unwrap();

        assert_eq!(manager.inner.ready().await, "<h1>from file</h1>");
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_fails_and_frees_the_flow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "overflow",
                "expires_in": 10_000_000_000_000_i64,
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "recovered", "expires_in": 36000 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        seed(&file, &seeded(chrono::Duration::minutes(5))).await;

        let manager = TokenManager::with_browser(
            config(&server, Some(file)),
            ScriptedBrowser::new("code=never"),
        )
        .unwrap();

        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::Serialization(_)));
        assert!(!manager.is_pending());
        assert_eq!(
            manager.session().await.access_token.as_deref(),
            Some("old-access")
        );

        assert_eq!(manager.access_token().await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn test_crashed_flow_does_not_block_later_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-access",
                "refresh_token": "fresh-refresh",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let inner = ScriptedBrowser::new("code=ABC");
        let browser = Arc::new(CrashOnce {
            crashed: AtomicBool::new(false),
            inner: inner.clone(),
        });
        let manager = TokenManager::with_browser(config(&server, None), browser).unwrap();

        let crashed = tokio::spawn({
            let manager = manager.clone();
            async move { manager.access_token().await }
        })
        .await;
        assert!(crashed.unwrap_err().is_panic());
        assert!(!manager.is_pending());

        assert_eq!(manager.access_token().await.unwrap(), "fresh-access");
        assert_eq!(inner.opened().len(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_authorization_releases_listener() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let browser = Arc::new(IdleBrowser::default());
        let manager = TokenManager::with_browser(config(&server, None), browser.clone()).unwrap();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(300), manager.access_token()).await;
        assert!(timed_out.is_err());
        assert!(!manager.is_pending());

        let addr = redirect_addr(&browser.opened.lock()[0]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(tokio::net::TcpStream::connect(&addr).await.is_err());

        // The next caller starts over instead of joining the abandoned flow.
        let _ = tokio::time::timeout(Duration::from_millis(100), manager.access_token()).await;
        assert_eq!(browser.opened.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_waits_for_in_flight_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .and(body_partial_json(json!({ "grant_type": "refresh_token" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "new-access", "expires_in": 7200 }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .and(body_partial_json(json!({
                "refresh_token": "old-refresh",
                "grant_type": "revoke_token",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempdir().unwrap();
        let file = temp.path().join("session.json");
        seed(&file, &seeded(chrono::Duration::minutes(10))).await;

        let manager = TokenManager::with_browser(
            config(&server, Some(file.clone())),
            ScriptedBrowser::new("code=never"),
        )
        .unwrap();

        let refreshing = tokio::spawn({
            let manager = manager.clone();
            async move { manager.access_token().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(manager.is_pending());

        manager.logout().await.unwrap();
        assert_eq!(refreshing.await.unwrap().unwrap(), "new-access");

        let session = manager.session().await;
        assert!(session.access_token.is_none());
        assert!(session.refresh_token.is_none());
        assert!(session.expires_at.is_none());

        let persisted = SessionStore::new(Some(file)).load().await;
        assert!(persisted.access_token.is_none());
        assert!(persisted.refresh_token.is_none());
        assert_eq!(persisted.user_id.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn test_bind_failure_reaches_every_waiter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-access",
                "refresh_token": "fresh-refresh",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let browser = ScriptedBrowser::new("code=ABC");
        let config = AuthConfig::builder()
            .client_id("sandbox")
            .client_secret("secret")
            .base(server.uri())
            .port(port)
            .build()
            .unwrap();
        let manager = TokenManager::with_browser(config, browser.clone()).unwrap();

        let calls = (0..4).map(|_| {
            let manager = manager.clone();
            async move { manager.access_token().await }
        });
        let outcomes = join_all(calls).await;

        assert!(outcomes
            .iter()
            .all(|o| matches!(o, Err(AuthError::Bind { .. }))));
        assert!(!manager.is_pending());
        assert!(browser.opened().is_empty());

        drop(taken);
        assert_eq!(manager.access_token().await.unwrap(), "fresh-access");
        assert_eq!(browser.opened().len(), 1);
    }
}
