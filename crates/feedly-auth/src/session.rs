//! Session record and its on-disk store.
//!
//! The record is persisted as a single JSON object. Fields the auth layer
//! does not interpret (plan, provider, ...) ride along in `extra` so they
//! survive a save/load cycle untouched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, Result};
use crate::oauth::TokenGrant;

/// Keys removed from the record on logout, besides the typed token fields.
const CREDENTIAL_KEYS: &[&str] = &["plan", "provider", "token_type"];

/// Credential/session state for one client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute expiry instant of `access_token`.
    #[serde(
        default,
        rename = "expires",
        skip_serializing_if = "Option::is_none",
        with = "expiry"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    /// Feedly user id, used to build `user/<id>/...` stream ids.
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Passthrough fields returned by the service.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What a caller must do before it can use the record's token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// No usable token: run the authorization flow.
    Missing,
    /// Valid, but within the refresh window.
    Expiring,
    /// Valid and outside the refresh window.
    Fresh(String),
}

impl SessionRecord {
    /// Access token, refresh token and expiry are all present and the
    /// expiry lies strictly after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some()
            && self.refresh_token.is_some()
            && self.expires_at.is_some_and(|expires| expires > now)
    }

    /// Classify the record at `now` with the given refresh lead time.
    pub fn token_state(&self, now: DateTime<Utc>, slop: Duration) -> TokenState {
        if !self.is_valid_at(now) {
            return TokenState::Missing;
        }
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires)) => {
                let remaining = (expires - now).to_std().unwrap_or_default();
                if remaining < slop {
                    TokenState::Expiring
                } else {
                    TokenState::Fresh(token.clone())
                }
            }
            _ => TokenState::Missing,
        }
    }

    /// Time left before expiry, or `None` when there is no expiry or it has passed.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .and_then(|expires| (expires - now).to_std().ok())
    }

    /// Merge a token endpoint response over the record, recomputing the
    /// absolute expiry from the reported lifetime.
    ///
    /// A lifetime that does not fit in a timestamp is rejected and the
    /// record is left untouched.
    pub fn apply_grant(&mut self, grant: TokenGrant, now: DateTime<Utc>) -> Result<()> {
        let expires_at = chrono::Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::Serialization(format!(
                    "Token lifetime out of range: {}s",
                    grant.expires_in
                ))
            })?;

        self.access_token = Some(grant.access_token);
        if let Some(refresh) = grant.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.expires_at = Some(expires_at);
        self.extra
            .insert("expires_in".to_string(), Value::from(grant.expires_in));
        self.merge_fields(grant.extra);
        Ok(())
    }

    /// Merge arbitrary response fields over the record; new values win.
    pub fn merge_fields(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                "access_token" => self.access_token = value.as_str().map(str::to_string),
                "refresh_token" => self.refresh_token = value.as_str().map(str::to_string),
                "id" => self.user_id = value.as_str().map(str::to_string),
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }

    /// Drop the access token, refresh token, expiry and provider/plan fields.
    /// Everything else (notably the user id) is kept.
    pub fn clear_credentials(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.expires_at = None;
        for key in CREDENTIAL_KEYS {
            self.extra.remove(*key);
        }
    }
}

/// Serde adapter for the persisted expiry.
///
/// Writes RFC 3339; reads RFC 3339 strings or epoch milliseconds (as a
/// number or a numeric string).
mod expiry {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(instant) => serializer.serialize_str(&instant.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(parse))
    }

    fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| s.parse::<i64>().ok().and_then(from_millis)),
            Value::Number(n) => n.as_i64().and_then(from_millis),
            _ => None,
        }
    }

    fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(ms).single()
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// Owner of the on-disk session representation.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Store backed by `path`; `None` disables persistence.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the persisted record.
    ///
    /// A missing or unparseable file yields an empty record: no session yet.
    pub async fn load(&self) -> SessionRecord {
        let Some(path) = &self.path else {
            return SessionRecord::default();
        };

        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No session file, starting empty");
                return SessionRecord::default();
            }
        };

        match serde_json::from_slice::<SessionRecord>(&content) {
            Ok(record) => {
                tracing::info!(path = %path.display(), "Session loaded");
                record
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Session file unreadable, starting empty");
                SessionRecord::default()
            }
        }
    }

    /// Overwrite the persisted record. No-op without a path.
    pub async fn save(&self, record: &SessionRecord) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AuthError::Persistence(format!("Failed to create session directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(record).map_err(|e| {
            AuthError::Serialization(format!("Failed to serialize session: {}", e))
        })?;

        tokio::fs::write(path, json)
            .await
            .map_err(|e| AuthError::Persistence(format!("Failed to write session file: {}", e)))?;

        tracing::info!(path = %path.display(), "Session saved");
        Ok(())
    }
}
