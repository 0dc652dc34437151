use async_trait::async_trait;

use super::schema::Database;
use super::types::StoreError;

/// Narrow key-value interface shared by the read cursor and the theme
/// preference.
///
/// `set` must not return `Ok` until the value is durable for the backing
/// store, so callers may treat a successful write as committed.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl PreferenceStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_preference(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.set_preference(key, value).await?)
    }
}
