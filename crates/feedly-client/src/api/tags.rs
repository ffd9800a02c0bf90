//! Tags API.
//!
//! Tag names may be bare (`saved`) or fully qualified
//! (`user/<uid>/tag/saved`); bare names are placed under the current user.

use crate::client::{FeedlyClient, Json};
use crate::error::{Error, Result};
use crate::normalize::encode_id;
use crate::types::{Ids, LabelRequest, TagEntriesRequest};

/// Tags API client.
pub struct TagsApi {
    client: FeedlyClient,
}

impl TagsApi {
    pub(crate) fn new(client: FeedlyClient) -> Self {
        Self { client }
    }

    /// Apply tags to a single entry. Sends `{"entryId": ...}`.
    pub async fn tag_entry(&self, entry: &str, tags: impl Into<Ids>) -> Result<Json> {
        if entry.is_empty() {
            return Err(Error::MissingArgument("entry"));
        }
        let tags = self.tag_path(tags.into()).await?;
        self.client
            .put(&tags, &TagEntriesRequest::One { entry_id: entry })
            .await
    }

    /// Apply tags to a list of entries. Sends `{"entryIds": [...]}`, even
    /// when the list holds one id.
    pub async fn tag_entries(&self, entries: impl Into<Ids>, tags: impl Into<Ids>) -> Result<Json> {
        let entries = entries.into();
        if entries.is_empty() {
            return Err(Error::MissingArgument("entry"));
        }
        let tags = self.tag_path(tags.into()).await?;
        self.client
            .put(
                &tags,
                &TagEntriesRequest::Many {
                    entry_ids: entries.as_slice(),
                },
            )
            .await
    }

    /// Rename a tag.
    pub async fn set_label(&self, tag: &str, label: &str) -> Result<Json> {
        let tag = self.tag_path(Ids::from(tag)).await?;
        self.client.post(&tag, &LabelRequest { label }).await
    }

    /// Remove tags from entries.
    pub async fn untag_entries(
        &self,
        entries: impl Into<Ids>,
        tags: impl Into<Ids>,
    ) -> Result<Json> {
        let entries = entries.into();
        if entries.is_empty() {
            return Err(Error::MissingArgument("entry"));
        }
        let tags = self.tag_path(tags.into()).await?;
        let entries = entries
            .as_slice()
            .iter()
            .map(|e| encode_id(e))
            .collect::<Vec<_>>()
            .join(",");
        self.client.delete(&format!("{}/{}", tags, entries)).await
    }

    /// Delete tags entirely.
    pub async fn delete(&self, tags: impl Into<Ids>) -> Result<Json> {
        let tags = self.tag_path(tags.into()).await?;
        self.client.delete(&tags).await
    }

    async fn tag_path(&self, tags: Ids) -> Result<String> {
        if tags.is_empty() {
            return Err(Error::MissingArgument("tag"));
        }
        Ok(format!("tags/{}", self.client.tag_list(tags.as_slice()).await?))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::test_support::{harness, harness_with_user};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_tag_single_entry() {
        let h = harness().await;
        Mock::given(method("PUT"))
            .and(path("/v3/tags/user%2Fu-1%2Ftag%2Ffoo"))
            .and(body_json(json!({"entryId": "e1"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client.tags().tag_entry("e1", "foo").await.unwrap();
    }

    #[tokio::test]
    async fn test_one_element_list_keeps_list_shape() {
        let h = harness().await;
        Mock::given(method("PUT"))
            .and(path("/v3/tags/user%2Fu-1%2Ftag%2Ffoo"))
            .and(body_json(json!({"entryIds": ["e1"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client.tags().tag_entries(vec!["e1"], "foo").await.unwrap();
    }

    #[tokio::test]
    async fn test_tag_many_entries_with_mixed_tags() {
        let h = harness().await;
        Mock::given(method("PUT"))
            .and(path("/v3/tags/user%2Fu-1%2Ftag%2Ffoo,user%2Fx%2Ftag%2Fbar"))
            .and(body_json(json!({"entryIds": ["e1", "e2"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client
            .tags()
            .tag_entries(["e1", "e2"], ["foo", "user/x/tag/bar"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_label() {
        let h = harness().await;
        Mock::given(method("POST"))
            .and(path("/v3/tags/user%2Fu-1%2Ftag%2Ffoo"))
            .and(body_json(json!({"label": "Foo"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client.tags().set_label("foo", "Foo").await.unwrap();
    }

    #[tokio::test]
    async fn test_untag_encodes_entries() {
        let h = harness().await;
        Mock::given(method("DELETE"))
            .and(path("/v3/tags/user%2Fu-1%2Ftag%2Ffoo/a%2Fb,c%3D"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client
            .tags()
            .untag_entries(["a/b", "c="], "foo")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_tags() {
        let h = harness().await;
        Mock::given(method("DELETE"))
            .and(path("/v3/tags/user%2Fu-1%2Ftag%2Fa,user%2Fu-1%2Ftag%2Fb"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client.tags().delete(vec!["a", "b"]).await.unwrap();
    }

    #[tokio::test]
    async fn test_qualified_tags_skip_user_lookup() {
        let h = harness_with_user(None).await;
        Mock::given(method("DELETE"))
            .and(path("/v3/tags/user%2Fx%2Ftag%2Fa"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&h.server)
            .await;

        h.client.tags().delete("user/x/tag/a").await.unwrap();
        let err = h.client.tags().delete("a").await.unwrap_err();
        assert!(matches!(err, Error::UnknownUser));
    }

    #[tokio::test]
    async fn test_empty_tags_rejected() {
        let h = harness().await;
        let err = h
            .client
            .tags()
            .delete(Vec::<String>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingArgument("tag")));
    }
}
