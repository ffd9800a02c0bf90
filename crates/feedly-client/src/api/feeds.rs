//! Feeds API.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::normalize::encode_id;
use crate::types::Ids;

/// Feeds API client.
pub struct FeedsApi {
    client: FeedlyClient,
}

impl FeedsApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Get feed metadata, e.g. `feed/http://example.com/rss`.
    pub async fn get(&self, id: &str) -> Result<Json> {
        if id.is_empty() {
            return Err(Error::MissingArgument("feed"));
        }
        self.client.get(&format!("feeds/{}", encode_id(id))).await
    }

    /// Get metadata for several feeds.
    pub async fn get_many(&self, ids: impl Into<Ids>) -> Result<Json> {
        let ids = ids.into();
        if ids.is_empty() {
            return Err(Error::MissingArgument("feed"));
        }
        self.client.post("feeds/.mget", &ids).await
    }
}
