use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another launcher instance has locked the database
    #[error("Another instance of the launcher appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }

    /// Like [`from_sqlx`](Self::from_sqlx) for connection errors. SQLITE_CANTOPEN
    /// only means another process holds the file when the file already existed;
    /// otherwise it is a bad path or a missing directory.
    pub(crate) fn from_connect(err: sqlx::Error, file_existed: bool) -> Self {
        let message = err.to_string().to_lowercase();
        if file_existed && message.contains("unable to open database file") {
            return DatabaseError::InstanceLocked;
        }
        Self::from_sqlx(err)
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6): another connection holds the lock.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
}

/// Failure of a key-value read or write behind [`PreferenceStore`].
///
/// [`PreferenceStore`]: super::PreferenceStore
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store refused the operation (e.g. a fake configured to fail)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
