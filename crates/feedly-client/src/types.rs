//! Request types for the Feedly API.
//!
//! Responses are passed through as [`serde_json::Value`]; only request
//! payloads are typed.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

// ─────────────────────────────────────────────────────────────────────────────
// Id lists
// ─────────────────────────────────────────────────────────────────────────────

/// One or more ids. Built from a single id or any list of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ids(pub Vec<String>);

impl Ids {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Ids {
    fn from(id: &str) -> Self {
        Ids(vec![id.to_string()])
    }
}

impl From<String> for Ids {
    fn from(id: String) -> Self {
        Ids(vec![id])
    }
}

impl From<&String> for Ids {
    fn from(id: &String) -> Self {
        Ids(vec![id.clone()])
    }
}

impl From<Vec<String>> for Ids {
    fn from(ids: Vec<String>) -> Self {
        Ids(ids)
    }
}

impl From<Vec<&str>> for Ids {
    fn from(ids: Vec<&str>) -> Self {
        Ids(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Ids {
    fn from(ids: &[&str]) -> Self {
        Ids(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for Ids {
    fn from(ids: &[String]) -> Self {
        Ids(ids.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Ids {
    fn from(ids: [&str; N]) -> Self {
        Ids(ids.iter().map(|s| s.to_string()).collect())
    }
}

/// Timestamps go over the wire as epoch milliseconds.
fn epoch_millis<S: Serializer>(at: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => s.serialize_i64(at.timestamp_millis()),
        None => s.serialize_none(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Markers
// ─────────────────────────────────────────────────────────────────────────────

/// Cut-off for marking a feed or category as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkSince {
    /// Everything published up to this instant.
    AsOf(DateTime<Utc>),
    /// Everything up to and including this entry.
    LastReadEntryId(String),
}

impl From<DateTime<Utc>> for MarkSince {
    fn from(at: DateTime<Utc>) -> Self {
        MarkSince::AsOf(at)
    }
}

impl From<String> for MarkSince {
    fn from(id: String) -> Self {
        MarkSince::LastReadEntryId(id)
    }
}

impl From<&str> for MarkSince {
    fn from(id: &str) -> Self {
        MarkSince::LastReadEntryId(id.to_string())
    }
}

/// Kind of object a marker request applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Entries,
    Feeds,
    Categories,
}

/// Marker action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerAction {
    MarkAsRead,
    KeepUnread,
}

/// Body of `POST /v3/markers`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRequest {
    #[serde(rename = "type")]
    pub kind: MarkerType,
    pub action: MarkerAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_ids: Option<Ids>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_ids: Option<Ids>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_entry_id: Option<String>,
}

impl MarkerRequest {
    pub(crate) fn new(kind: MarkerType, action: MarkerAction) -> Self {
        Self {
            kind,
            action,
            entry_ids: None,
            feed_ids: None,
            category_ids: None,
            as_of: None,
            last_read_entry_id: None,
        }
    }

    pub(crate) fn since(mut self, since: Option<MarkSince>) -> Self {
        match since {
            Some(MarkSince::AsOf(at)) => self.as_of = Some(at.timestamp_millis()),
            Some(MarkSince::LastReadEntryId(id)) => self.last_read_entry_id = Some(id),
            None => {}
        }
        self
    }
}

/// Query of `GET /v3/markers/counts`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorefresh: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "epoch_millis")]
    pub newer_than: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
}

/// Query of `GET /v3/markers/reads` and `GET /v3/markers/tags`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewerThanQuery {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "epoch_millis")]
    pub newer_than: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Streams
// ─────────────────────────────────────────────────────────────────────────────

/// Paging and filtering options for stream listings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
    /// Cursor returned by the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// `newest` or `oldest`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "epoch_millis")]
    pub newer_than: Option<DateTime<Utc>>,
}

impl StreamQuery {
    /// Options holding only a continuation cursor.
    pub fn continuation(cursor: impl Into<String>) -> Self {
        Self {
            continuation: Some(cursor.into()),
            ..Default::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscriptions, search, tags
// ─────────────────────────────────────────────────────────────────────────────

/// Category attached to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionCategory {
    pub id: String,
    pub name: String,
}

/// Body of `POST /v3/subscriptions`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubscribeRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<SubscriptionCategory>>,
}

/// Body carrying a new label.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LabelRequest<'a> {
    pub label: &'a str,
}

/// Query of `GET /v3/search/feeds`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchQuery<'a> {
    pub query: &'a str,
    pub n: u32,
}

/// Query of `GET /v3/shorten/entries`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ShortenQuery<'a> {
    pub entry_id: &'a str,
}

/// Body of `PUT /v3/tags/<tags>`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum TagEntriesRequest<'a> {
    #[serde(rename_all = "camelCase")]
    One { entry_id: &'a str },
    #[serde(rename_all = "camelCase")]
    Many { entry_ids: &'a [String] },
}

/// Query of `GET /v3/streams/<id>/contents`.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ContentsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<&'a str>,
}
