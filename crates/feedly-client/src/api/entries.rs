//! Entries API.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::normalize::encode_id;
use crate::types::{Ids, ShortenQuery};

/// Entries API client.
pub struct EntriesApi {
    client: FeedlyClient,
}

impl EntriesApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Get one entry.
    pub async fn get(&self, id: &str) -> Result<Json> {
        if id.is_empty() {
            return Err(Error::MissingArgument("entry"));
        }
        self.client
            .get(&format!("entries/{}", encode_id(id)))
            .await
    }

    /// Get several entries in one call.
    pub async fn get_many(&self, ids: impl Into<Ids>) -> Result<Json> {
        let ids = ids.into();
        if ids.is_empty() {
            return Err(Error::MissingArgument("entry"));
        }
        self.client.post("entries/.mget", &ids).await
    }

    /// Create an entry and tag it (the payload carries its own tags).
    pub async fn create(&self, entry: &Json) -> Result<Json> {
        if entry.is_null() {
            return Err(Error::MissingArgument("entry"));
        }
        self.client.post("entries/", entry).await
    }

    /// Get a short URL for an entry.
    pub async fn shorten(&self, entry_id: &str) -> Result<Json> {
        if entry_id.is_empty() {
            return Err(Error::MissingArgument("entry"));
        }
        self.client
            .get_with_query("shorten/entries", &ShortenQuery { entry_id })
            .await
    }
}
