//! Categories API.

use crate::client::{FeedlyClient, Json};
use crate::error::Result;
use crate::normalize::encode_id;
use crate::types::LabelRequest;

/// Categories API client.
pub struct CategoriesApi {
    client: FeedlyClient,
}

impl CategoriesApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// List the user's categories.
    pub async fn list(&self) -> Result<Json> {
        self.client.get("categories").await
    }

    /// Rename a category. Bare names are qualified with the user's namespace.
    pub async fn set_label(&self, id: &str, label: &str) -> Result<Json> {
        let path = self.path(id).await?;
        self.client.post(&path, &LabelRequest { label }).await
    }

    /// Delete a category.
    pub async fn delete(&self, id: &str) -> Result<Json> {
        let path = self.path(id).await?;
        self.client.delete(&path).await
    }

    async fn path(&self, id: &str) -> Result<String> {
        let ids = self.client.category_ids(&[id]).await?;
        let id = ids.first().map(String::as_str).unwrap_or(id);
        Ok(format!("categories/{}", encode_id(id)))
    }
}
