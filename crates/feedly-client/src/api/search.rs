//! Search API.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::types::SearchQuery;

/// Number of results when none is requested.
pub const DEFAULT_RESULTS: u32 = 20;

/// Search API client.
pub struct SearchApi {
    client: FeedlyClient,
}

impl SearchApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Find feeds by title, URL or `#topic`.
    pub async fn feeds(&self, query: &str, results: Option<u32>) -> Result<Json> {
        if query.is_empty() {
            return Err(Error::MissingArgument("query"));
        }
        let query = SearchQuery {
            query,
            n: results.unwrap_or(DEFAULT_RESULTS),
        };
        self.client.get_with_query("search/feeds", &query).await
    }
}
