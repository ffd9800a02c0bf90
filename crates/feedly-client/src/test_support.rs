//! Shared fixtures for API tests: a mock service and a client whose
//! session already holds a fresh token.

use std::sync::Arc;

use chrono::Utc;
use feedly_auth::{AuthConfig, BrowserLauncher, SessionRecord, SessionStore};
use serde_json::Map;
use tempfile::TempDir;
use wiremock::MockServer;

use crate::client::FeedlyClient;

pub(crate) const TOKEN: &str = "tok";
pub(crate) const USER: &str = "u-1";

/// Fails the test if anything tries to authorize through the browser.
#[derive(Debug)]
struct NoBrowser;

impl BrowserLauncher for NoBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        panic!("unexpected browser launch: {url}");
    }
}

pub(crate) struct Harness {
    pub server: MockServer,
    pub client: FeedlyClient,
    _dir: TempDir,
}

pub(crate) async fn harness() -> Harness {
    harness_with_user(Some(USER)).await
}

pub(crate) async fn harness_with_user(user: Option<&str>) -> Harness {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let record = SessionRecord {
        access_token: Some(TOKEN.into()),
        refresh_token: Some("refresh".into()),
        expires_at: Some(Utc::now() + chrono::Duration::days(1)),
        user_id: user.map(str::to_string),
        extra: Map::new(),
    };
    SessionStore::new(Some(file.clone()))
        .save(&record)
        .await
        .unwrap();

    let config = AuthConfig::builder()
        .client_id("sandbox")
        .client_secret("secret")
        .base(server.uri())
        .session_file(file)
        .build()
        .unwrap();
    let client = FeedlyClient::builder(config)
        .browser(Arc::new(NoBrowser))
        .build()
        .unwrap();

    Harness {
        server,
        client,
        _dir: dir,
    }
}

pub(crate) fn auth_header() -> String {
    format!("OAuth {}", TOKEN)
}
