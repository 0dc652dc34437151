//! News feed core: entry model, client-side filtering, and the unread-tracking
//! sync state machine.
//!
//! - [`model`] - `NewsEntry`, the closed `Tag` set, and response ingestion
//! - [`filter`] - query/tag filtering over loaded entries
//! - [`sync`] - `NewsFeedSync`, which owns `FeedState` and the read cursor

mod filter;
mod model;
mod sync;

use async_trait::async_trait;

use crate::api::FetchError;

pub use filter::{filter, matches_query, TagFilter};
pub use model::{ingest, NewsEntry, Tag, WireNewsEntry};
pub use sync::{compute_unread, FeedEvent, FeedState, LoadTicket, NewsFeedSync, UnreadCount};

/// Remote read-only list of news entries.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_news(&self) -> Result<Vec<NewsEntry>, FetchError>;
}
