//! Profile API.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};

/// Profile API client.
pub struct ProfileApi {
    client: FeedlyClient,
}

impl ProfileApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Get the user's profile.
    pub async fn get(&self) -> Result<Json> {
        self.client.get("profile").await
    }

    /// Update profile fields.
    pub async fn update(&self, profile: &Json) -> Result<Json> {
        if profile.is_null() {
            return Err(Error::MissingArgument("profile"));
        }
        self.client.post("profile", profile).await
    }
}
