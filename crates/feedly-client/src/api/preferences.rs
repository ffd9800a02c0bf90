//! Preferences API.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};

/// Preferences API client.
pub struct PreferencesApi {
    client: FeedlyClient,
}

impl PreferencesApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Get the user's application-specific preferences.
    pub async fn get(&self) -> Result<Json> {
        self.client.get("preferences").await
    }

    /// Update preferences. A value of `"==DELETE=="` removes a key.
    pub async fn update(&self, prefs: &Json) -> Result<Json> {
        if prefs.is_null() {
            return Err(Error::MissingArgument("prefs"));
        }
        self.client.post("preferences", prefs).await
    }
}
