//! Feed state machine: load lifecycle, unread bookkeeping, read cursor.
//!
//! A `NewsFeedSync` is one activation of the news view. Loads are tagged with
//! a generation counter; only the result of the most recent `begin_load` is
//! applied, and nothing is applied after `deactivate`. The network call of a
//! superseded load is allowed to finish, its result is simply dropped.
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::filter::{filter, TagFilter};
use super::model::NewsEntry;
use super::NewsSource;
use crate::api::FetchError;
use crate::storage::{ReadCursor, ReadCursorStore};

// ============================================================================
// Unread computation
// ============================================================================

/// Result of [`compute_unread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadCount {
    pub unread: usize,
    /// The cursor was ahead of every loaded id and must be reset to zero.
    pub rollback: bool,
}

/// Count entries newer than `cursor`.
///
/// A cursor above the highest loaded id means the server dataset was reset;
/// the count is then taken against zero and `rollback` is set. An empty list
/// is never treated as a rollback.
pub fn compute_unread(entries: &[NewsEntry], cursor: ReadCursor) -> UnreadCount {
    let Some(max_id) = entries.iter().map(|e| e.id).max() else {
        return UnreadCount {
            unread: 0,
            rollback: false,
        };
    };

    let rollback = cursor.get() > max_id;
    let effective = if rollback { ReadCursor::ZERO } else { cursor };
    UnreadCount {
        unread: entries.iter().filter(|e| e.id > effective.get()).count(),
        rollback,
    }
}

// ============================================================================
// FeedState
// ============================================================================

/// Everything the news panel renders. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub entries: Vec<NewsEntry>,
    pub loading: bool,
    /// Message of the last failed load
    pub error: Option<String>,
    pub unread_count: usize,
    /// Set when the read cursor could not be saved; in-memory state is still current.
    pub persist_warning: Option<String>,
}

/// Identifies one `begin_load` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Completion of a background load started with [`NewsFeedSync::spawn_load`].
#[derive(Debug)]
pub enum FeedEvent {
    Loaded {
        ticket: LoadTicket,
        result: Result<Vec<NewsEntry>, FetchError>,
    },
}

// ============================================================================
// NewsFeedSync
// ============================================================================

pub struct NewsFeedSync {
    source: Arc<dyn NewsSource>,
    cursors: ReadCursorStore,
    cursor: ReadCursor,
    state: FeedState,
    generation: u64,
    active: bool,
}

impl NewsFeedSync {
    /// Activate the feed: reads the persisted cursor, does not fetch yet.
    pub async fn activate(source: Arc<dyn NewsSource>, cursors: ReadCursorStore) -> Self {
        let cursor = cursors.read().await;
        tracing::debug!(cursor = %cursor, "News feed activated");
        Self {
            source,
            cursors,
            cursor,
            state: FeedState::default(),
            generation: 0,
            active: true,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn cursor(&self) -> ReadCursor {
        self.cursor
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Loaded entries matching `query` and `tag_filter`, in feed order.
    pub fn visible(&self, query: &str, tag_filter: TagFilter) -> Vec<&NewsEntry> {
        filter(&self.state.entries, query, tag_filter)
    }

    /// Start a load: marks the state loading, clears the previous error, and
    /// supersedes any load still in flight. Returns `None` and leaves the state
    /// untouched once the feed is deactivated.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if !self.active {
            tracing::debug!("Ignoring news load request after teardown");
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.state.loading = true;
        self.state.error = None;
        Some(LoadTicket {
            generation: self.generation,
        })
    }

    /// Apply the outcome of a load. Returns `false` when the result was
    /// discarded because it is stale or the feed was torn down.
    pub async fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<NewsEntry>, FetchError>,
    ) -> bool {
        if !self.active {
            tracing::debug!(
                generation = ticket.generation,
                "Ignoring news load after teardown"
            );
            return false;
        }
        if ticket.generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = ticket.generation,
                "Ignoring stale news load (generation mismatch)"
            );
            return false;
        }

        self.state.loading = false;
        match result {
            Ok(entries) => {
                self.state.entries = entries;
                self.state.error = None;
                self.recompute_unread().await;
                tracing::info!(
                    entries = self.state.entries.len(),
                    unread = self.state.unread_count,
                    "News feed loaded"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "News feed load failed");
                self.state.error = Some(e.to_string());
                self.state.entries.clear();
                self.state.unread_count = 0;
            }
        }
        true
    }

    /// Fetch from the source and apply the result in one step.
    pub async fn load(&mut self) {
        let Some(ticket) = self.begin_load() else {
            return;
        };
        let result = self.source.fetch_news().await;
        self.finish_load(ticket, result).await;
    }

    /// Run the fetch on a background task; the result arrives as a
    /// [`FeedEvent`] to be passed to [`handle_event`](Self::handle_event).
    /// Nothing is spawned on a deactivated feed.
    pub fn spawn_load(&mut self, events: mpsc::Sender<FeedEvent>) -> Option<JoinHandle<()>> {
        let ticket = self.begin_load()?;
        let source = Arc::clone(&self.source);
        Some(tokio::spawn(async move {
            let result = source.fetch_news().await;
            if events
                .send(FeedEvent::Loaded { ticket, result })
                .await
                .is_err()
            {
                tracing::debug!(
                    generation = ticket.generation,
                    "Feed event receiver dropped, load result discarded"
                );
            }
        }))
    }

    pub async fn handle_event(&mut self, event: FeedEvent) -> bool {
        match event {
            FeedEvent::Loaded { ticket, result } => self.finish_load(ticket, result).await,
        }
    }

    /// Acknowledge every loaded entry. No-op on an empty feed.
    pub async fn mark_all_read(&mut self) {
        let Some(max_id) = self.state.entries.iter().map(|e| e.id).max() else {
            tracing::debug!("Nothing to mark read");
            return;
        };

        // The cursor only moves forward here.
        let target = ReadCursor::new(max_id)
            .unwrap_or(ReadCursor::ZERO)
            .max(self.cursor);
        self.set_cursor(target).await;
        self.recompute_unread().await;
        tracing::info!(cursor = %self.cursor, "News marked read");
    }

    /// Stop applying load results. In-flight fetches still run to completion.
    pub fn deactivate(&mut self) {
        if self.active {
            tracing::debug!(generation = self.generation, "News feed deactivated");
        }
        self.active = false;
    }

    async fn recompute_unread(&mut self) {
        let count = compute_unread(&self.state.entries, self.cursor);
        if count.rollback {
            tracing::info!(
                cursor = %self.cursor,
                "Read cursor is ahead of the feed, resetting to 0"
            );
            self.set_cursor(ReadCursor::ZERO).await;
        }
        self.state.unread_count = count.unread;
    }

    /// Update the in-memory cursor, then persist it before returning.
    async fn set_cursor(&mut self, cursor: ReadCursor) {
        self.cursor = cursor;
        match self.cursors.write(cursor).await {
            Ok(()) => self.state.persist_warning = None,
            Err(e) => {
                tracing::warn!(cursor = %cursor, error = %e, "Failed to persist read cursor");
                self.state.persist_warning = Some(format!("Read position not saved: {}", e));
            }
        }
    }
}
