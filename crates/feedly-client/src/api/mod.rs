//! API endpoint implementations.

mod categories;
mod entries;
mod feeds;
mod markers;
mod preferences;
mod profile;
mod search;
mod streams;
mod subscriptions;
mod tags;

pub use categories::CategoriesApi;
pub use entries::EntriesApi;
pub use feeds::FeedsApi;
pub use markers::MarkersApi;
pub use preferences::PreferencesApi;
pub use profile::ProfileApi;
pub use search::{DEFAULT_RESULTS, SearchApi};
pub use streams::StreamsApi;
pub use subscriptions::SubscriptionsApi;
pub use tags::TagsApi;
