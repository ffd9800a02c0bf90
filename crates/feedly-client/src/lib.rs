//! Typed client for the Feedly cloud API.
//!
//! Every call goes through the session manager from `feedly-auth`: a fresh
//! token is used as is, an expiring one is refreshed, and a missing one
//! sends the user through the browser authorization flow first.
//!
//! # Example
//!
//! ```no_run
//! use feedly_client::{FeedlyClient, MarkSince, Result, StreamQuery};
//!
//! # async fn example() -> Result<()> {
//! let options = feedly_config::load_config(None)?;
//! let client = FeedlyClient::from_config(&options)?;
//!
//! // Unread entries of everything the user follows
//! let page = client
//!     .streams()
//!     .ids("user/-/category/global.all", &StreamQuery {
//!         unread_only: Some(true),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", page["ids"]);
//!
//! // Tag an entry and mark its feed read
//! client.tags().tag_entry("entry-id", "later").await?;
//! client
//!     .markers()
//!     .mark_feeds_read("feed/http://example.com/rss", Some(MarkSince::from("entry-id")))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Categories**: list, relabel, delete
//! - **Entries**: get one or many, create, shorten
//! - **Feeds**: get one or many
//! - **Markers**: unread counts, mark read/unread, recent reads and tags
//! - **Preferences** and **Profile**: get, update
//! - **Search**: feeds
//! - **Streams**: entry ids and contents, paged by continuation
//! - **Subscriptions**: list, subscribe, unsubscribe
//! - **Tags**: tag, relabel, untag, delete

pub mod api;
pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{ClientBuilder, FeedlyClient, Json};
pub use error::{Error, Result};
pub use types::*;

pub use feedly_auth::{AuthConfig, BrowserLauncher, SessionRecord, TokenManager};
