use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Tag
// ============================================================================

/// Closed category set for news entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Update,
    Announcement,
    Event,
}

impl Tag {
    pub const ALL: [Tag; 3] = [Tag::Update, Tag::Announcement, Tag::Event];

    /// Exact (case-insensitive) name lookup. Unknown names are `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "update" => Some(Self::Update),
            "announcement" => Some(Self::Announcement),
            "event" => Some(Self::Event),
            _ => None,
        }
    }

    /// Ingestion rule: anything outside the closed set becomes `Announcement`.
    pub fn normalize(raw: &str) -> Self {
        Self::from_name(raw).unwrap_or_else(|| {
            tracing::debug!(tag = %raw, "Unknown news tag, treating as announcement");
            Self::Announcement
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Announcement => "announcement",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown tag '{}'", s))
    }
}

// ============================================================================
// NewsEntry
// ============================================================================

/// One item of `GET /api/news`, exactly as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireNewsEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tag: String,
    pub created_at: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A news item after ingestion: tag normalized, duplicates resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tag: Tag,
    /// ISO-8601 timestamp, display only
    pub created_at: String,
    pub image_url: Option<String>,
}

impl From<WireNewsEntry> for NewsEntry {
    fn from(wire: WireNewsEntry) -> Self {
        Self {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            tag: Tag::normalize(&wire.tag),
            created_at: wire.created_at,
            image_url: wire.image_url.filter(|url| !url.trim().is_empty()),
        }
    }
}

impl NewsEntry {
    /// `created_at` as `YYYY-MM-DD HH:MM` UTC, or verbatim if it is not RFC 3339.
    pub fn created_display(&self) -> String {
        match chrono::DateTime::parse_from_rfc3339(&self.created_at) {
            Ok(ts) => ts
                .with_timezone(&chrono::Utc)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            Err(_) => self.created_at.clone(),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

/// Normalize a server response into feed entries.
///
/// Tags are coerced once here. When an id repeats, the last occurrence wins
/// and takes the position of that last occurrence; server order is otherwise
/// preserved.
pub fn ingest(wire: Vec<WireNewsEntry>) -> Vec<NewsEntry> {
    let mut last_index: HashMap<i64, usize> = HashMap::with_capacity(wire.len());
    for (index, entry) in wire.iter().enumerate() {
        last_index.insert(entry.id, index);
    }

    let duplicates = wire.len() - last_index.len();
    if duplicates > 0 {
        tracing::warn!(duplicates, "News response repeats ids, keeping last occurrence");
    }

    wire.into_iter()
        .enumerate()
        .filter(|(index, entry)| last_index.get(&entry.id) == Some(index))
        .map(|(_, entry)| NewsEntry::from(entry))
        .collect()
}
