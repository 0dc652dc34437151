//! Launcher accent theme preference.
//!
//! Only the identifier is handled here; the UI maps it to colors. The value
//! is stored under [`THEME_KEY`] through the same [`PreferenceStore`] as the
//! news read cursor.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::{PreferenceStore, StoreError};

/// Preference key holding the theme identifier.
pub const THEME_KEY: &str = "theme";

// ============================================================================
// Theme Identifier
// ============================================================================

/// Fixed set of accent themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeId {
    #[default]
    Cyan,
    Indigo,
    Emerald,
    Rose,
}

impl ThemeId {
    pub const ALL: [ThemeId; 4] = [Self::Cyan, Self::Indigo, Self::Emerald, Self::Rose];

    /// Parse a theme identifier (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cyan" => Some(Self::Cyan),
            "indigo" => Some(Self::Indigo),
            "emerald" => Some(Self::Emerald),
            "rose" => Some(Self::Rose),
            _ => None,
        }
    }

    /// Stored identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::Cyan => "cyan",
            Self::Indigo => "indigo",
            Self::Emerald => "emerald",
            Self::Rose => "rose",
        }
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ThemeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_name(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|t| t.id()).collect();
            format!("unknown theme '{}' (expected one of: {})", s, known.join(", "))
        })
    }
}

// ============================================================================
// ThemePreference
// ============================================================================

/// Persistence adapter for the theme identifier.
#[derive(Clone)]
pub struct ThemePreference {
    store: Arc<dyn PreferenceStore>,
}

impl ThemePreference {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Stored theme, or `fallback` when absent, unknown, or unreadable.
    pub async fn read(&self, fallback: ThemeId) -> ThemeId {
        match self.store.get(THEME_KEY).await {
            Ok(Some(raw)) => ThemeId::from_str_name(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Stored theme is unknown, using fallback");
                fallback
            }),
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read theme preference");
                fallback
            }
        }
    }

    pub async fn write(&self, theme: ThemeId) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.id()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_from_str_name() {
        assert_eq!(ThemeId::from_str_name("cyan"), Some(ThemeId::Cyan));
        assert_eq!(ThemeId::from_str_name("ROSE"), Some(ThemeId::Rose));
        assert_eq!(ThemeId::from_str_name("dark"), None);
    }

    #[test]
    fn test_ids_parse_back() {
        for theme in ThemeId::ALL {
            assert_eq!(theme.id().parse::<ThemeId>(), Ok(theme));
        }
    }

    #[test]
    fn test_parse_error_lists_choices() {
        let err = "neon".parse::<ThemeId>().unwrap_err();
        assert!(err.contains("cyan, indigo, emerald, rose"), "{err}");
    }

    #[tokio::test]
    async fn test_read_fallbacks() {
        let store = Arc::new(MemoryStore::new());
        let prefs = ThemePreference::new(store.clone());
        assert_eq!(prefs.read(ThemeId::Indigo).await, ThemeId::Indigo);

        store.set(THEME_KEY, "plaid").await.unwrap();
        assert_eq!(prefs.read(ThemeId::Cyan).await, ThemeId::Cyan);

        store.set(THEME_KEY, "emerald").await.unwrap();
        store.set_fail_reads(true);
        assert_eq!(prefs.read(ThemeId::Rose).await, ThemeId::Rose);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = Arc::new(MemoryStore::new());
        let prefs = ThemePreference::new(store.clone());
        prefs.write(ThemeId::Emerald).await.unwrap();

        assert_eq!(store.peek(THEME_KEY).as_deref(), Some("emerald"));
        assert_eq!(prefs.read(ThemeId::Cyan).await, ThemeId::Emerald);
    }
}
