//! Subscriptions API.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::normalize::{self, encode_id};
use crate::types::{Ids, SubscribeRequest, SubscriptionCategory};

/// Subscriptions API client.
pub struct SubscriptionsApi {
    client: FeedlyClient,
}

impl SubscriptionsApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// List the user's subscriptions.
    pub async fn list(&self) -> Result<Json> {
        self.client.get("subscriptions").await
    }

    /// Subscribe to a feed. `url` may omit the `feed/` prefix.
    pub async fn subscribe(&self, url: &str) -> Result<Json> {
        self.send_subscribe(url, None).await
    }

    /// Subscribe to a feed and file it under the given categories.
    ///
    /// Bare category names become `user/<uid>/category/<name>`.
    pub async fn subscribe_with_categories(
        &self,
        url: &str,
        categories: impl Into<Ids>,
    ) -> Result<Json> {
        let categories = categories.into();
        let ids = self.client.category_ids(categories.as_slice()).await?;
        let categories = ids
            .into_iter()
            .zip(categories.as_slice())
            .map(|(id, given)| {
                let name = if normalize::is_qualified(given) {
                    normalize::category_name(given).unwrap_or(given).to_string()
                } else {
                    given.clone()
                };
                SubscriptionCategory { id, name }
            })
            .collect();
        self.send_subscribe(url, Some(categories)).await
    }

    /// Remove a subscription.
    pub async fn unsubscribe(&self, id: &str) -> Result<Json> {
        if id.is_empty() {
            return Err(Error::MissingArgument("feed"));
        }
        self.client
            .delete(&format!("subscriptions/{}", encode_id(id)))
            .await
    }

    async fn send_subscribe(
        &self,
        url: &str,
        categories: Option<Vec<SubscriptionCategory>>,
    ) -> Result<Json> {
        if url.is_empty() {
            return Err(Error::MissingArgument("url"));
        }
        let request = SubscribeRequest {
            id: normalize::feed_id(url).into_owned(),
            categories,
        };
        self.client.post("subscriptions", &request).await
    }
}
