//! Durable high-water mark of the news feed.
//!
//! The cursor is the highest news id the user has acknowledged. It is stored
//! as a base-10 integer string under [`READ_CURSOR_KEY`]; anything else found
//! there (missing key, garbage, negative numbers, unreadable store) reads
//! back as zero.
use std::fmt;
use std::sync::Arc;

use super::store::PreferenceStore;
use super::types::StoreError;

/// Preference key holding the cursor.
pub const READ_CURSOR_KEY: &str = "news.read_cursor";

/// Highest acknowledged news id. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadCursor(i64);

impl ReadCursor {
    pub const ZERO: ReadCursor = ReadCursor(0);

    /// Returns `None` for negative values.
    pub fn new(value: i64) -> Option<Self> {
        (value >= 0).then_some(Self(value))
    }

    /// Parse a stored value. Surrounding whitespace is tolerated.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().and_then(Self::new)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReadCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence adapter for [`ReadCursor`].
#[derive(Clone)]
pub struct ReadCursorStore {
    store: Arc<dyn PreferenceStore>,
}

impl ReadCursorStore {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Load the cursor, degrading every failure to [`ReadCursor::ZERO`].
    pub async fn read(&self) -> ReadCursor {
        match self.store.get(READ_CURSOR_KEY).await {
            Ok(Some(raw)) => ReadCursor::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(key = READ_CURSOR_KEY, value = %raw, "Stored read cursor is malformed, using 0");
                ReadCursor::ZERO
            }),
            Ok(None) => ReadCursor::ZERO,
            Err(e) => {
                tracing::warn!(key = READ_CURSOR_KEY, error = %e, "Failed to read cursor, using 0");
                ReadCursor::ZERO
            }
        }
    }

    /// Persist the cursor. `Ok` means the value is durable.
    pub async fn write(&self, cursor: ReadCursor) -> Result<(), StoreError> {
        self.store
            .set(READ_CURSOR_KEY, &cursor.get().to_string())
            .await
    }
}
