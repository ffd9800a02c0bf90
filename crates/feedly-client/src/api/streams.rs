//! Streams API.
//!
//! A stream is a feed, category or tag id. Listings are paged: each page
//! carries a `continuation` cursor to pass back for the next one.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::normalize::encode_id;
use crate::types::{ContentsQuery, StreamQuery};

/// Streams API client.
pub struct StreamsApi {
    client: FeedlyClient,
}

impl StreamsApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Entry ids of a stream.
    pub async fn ids(&self, id: &str, query: &StreamQuery) -> Result<Json> {
        let path = stream_path(id, "ids")?;
        self.client.get_with_query(&path, query).await
    }

    /// Full entries of a stream.
    pub async fn contents(&self, id: &str, continuation: Option<&str>) -> Result<Json> {
        let path = stream_path(id, "contents")?;
        self.client
            .get_with_query(&path, &ContentsQuery { continuation })
            .await
    }
}

fn stream_path(id: &str, what: &str) -> Result<String> {
    if id.is_empty() {
        return Err(Error::MissingArgument("stream"));
    }
    Ok(format!("streams/{}/{}", encode_id(id), what))
}
