use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::store::PreferenceStore;
use super::types::StoreError;

/// Process-local [`PreferenceStore`].
///
/// Backs `--no-persist` sessions and stands in for SQLite in tests. Reads and
/// writes can be switched to fail so the persistence-failure paths of the
/// feed can be exercised.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing values.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        if let Ok(mut map) = store.values.lock() {
            map.extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        }
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing the failure switches.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("read of '{}' refused", key)));
        }
        let map = self
            .values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("write of '{}' refused", key)));
        }
        let mut map = self
            .values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_seed() {
        let store = MemoryStore::with_values([("theme", "rose")]);
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("rose"));
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("theme", "cyan").await.unwrap();
        assert_eq!(store.peek("theme").as_deref(), Some("cyan"));
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let store = MemoryStore::with_values([("news.read_cursor", "4")]);

        store.set_fail_writes(true);
        assert!(matches!(
            store.set("news.read_cursor", "9").await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.peek("news.read_cursor").as_deref(), Some("4"));

        store.set_fail_reads(true);
        assert!(store.get("news.read_cursor").await.is_err());

        store.set_fail_reads(false);
        store.set_fail_writes(false);
        store.set("news.read_cursor", "9").await.unwrap();
        assert_eq!(store.get("news.read_cursor").await.unwrap().as_deref(), Some("9"));
    }
}
