//! Markers API: unread counts and read/unread state.

use chrono::{DateTime, Utc};

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::types::{
    CountsQuery, Ids, MarkSince, MarkerAction, MarkerRequest, MarkerType, NewerThanQuery,
};

/// Markers API client.
pub struct MarkersApi {
    client: FeedlyClient,
}

impl MarkersApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Unread counts for every stream.
    pub async fn counts(&self) -> Result<Json> {
        self.counts_with_query(CountsQuery::default()).await
    }

    /// Unread counts, filtered.
    pub async fn counts_with_query(&self, query: CountsQuery) -> Result<Json> {
        self.client.get_with_query("markers/counts", &query).await
    }

    /// Mark entries as read.
    pub async fn mark_entries_read(&self, ids: impl Into<Ids>) -> Result<Json> {
        self.mark_entries(ids.into(), MarkerAction::MarkAsRead).await
    }

    /// Keep entries unread.
    pub async fn mark_entries_unread(&self, ids: impl Into<Ids>) -> Result<Json> {
        self.mark_entries(ids.into(), MarkerAction::KeepUnread).await
    }

    /// Mark feeds as read, optionally only up to `since`.
    pub async fn mark_feeds_read(
        &self,
        ids: impl Into<Ids>,
        since: Option<MarkSince>,
    ) -> Result<Json> {
        let ids = required(ids.into(), "feed")?;
        let mut request =
            MarkerRequest::new(MarkerType::Feeds, MarkerAction::MarkAsRead).since(since);
        request.feed_ids = Some(ids);
        self.client.post("markers", &request).await
    }

    /// Mark categories as read, optionally only up to `since`.
    ///
    /// Bare category names are qualified with the user's namespace.
    pub async fn mark_categories_read(
        &self,
        ids: impl Into<Ids>,
        since: Option<MarkSince>,
    ) -> Result<Json> {
        let ids = required(ids.into(), "category")?;
        let mut request =
            MarkerRequest::new(MarkerType::Categories, MarkerAction::MarkAsRead).since(since);
        request.category_ids = Some(self.client.category_ids(ids.as_slice()).await?);
        self.client.post("markers", &request).await
    }

    /// Entries marked read since `newer_than` (or recently, if `None`).
    pub async fn reads(&self, newer_than: Option<DateTime<Utc>>) -> Result<Json> {
        self.client
            .get_with_query("markers/reads", &NewerThanQuery { newer_than })
            .await
    }

    /// Entries tagged since `newer_than` (or recently, if `None`).
    pub async fn tags(&self, newer_than: Option<DateTime<Utc>>) -> Result<Json> {
        self.client
            .get_with_query("markers/tags", &NewerThanQuery { newer_than })
            .await
    }

    async fn mark_entries(&self, ids: Ids, action: MarkerAction) -> Result<Json> {
        let ids = required(ids, "entry")?;
        let mut request = MarkerRequest::new(MarkerType::Entries, action);
        request.entry_ids = Some(ids);
        self.client.post("markers", &request).await
    }
}

fn required(ids: Ids, what: &'static str) -> Result<Ids> {
    if ids.is_empty() {
        Err(Error::MissingArgument(what))
    } else {
        Ok(ids)
    }
}
