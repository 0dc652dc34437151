//! Durability of the read cursor and theme across database reopen.
//!
//! Each test uses its own file under the system temp directory.

use nuvion_launcher::storage::{Database, ReadCursor, ReadCursorStore, READ_CURSOR_KEY};
use nuvion_launcher::theme::{ThemeId, ThemePreference};
use std::path::PathBuf;
use std::sync::Arc;

fn temp_db_path(name: &str) -> (PathBuf, String) {
    let dir = std::env::temp_dir().join(format!("nuvion_persistence_{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("launcher.db");
    let _ = std::fs::remove_file(&path);
    let path_str = path.to_str().unwrap().to_string();
    (dir, path_str)
}

#[tokio::test]
async fn test_cursor_survives_reopen() {
    let (dir, path) = temp_db_path("cursor");

    {
        let db = Database::open(&path).await.unwrap();
        let cursors = ReadCursorStore::new(Arc::new(db.clone()));
        assert_eq!(cursors.read().await, ReadCursor::ZERO);
        cursors.write(ReadCursor::new(12).unwrap()).await.unwrap();
    }

    let db = Database::open(&path).await.unwrap();
    let cursors = ReadCursorStore::new(Arc::new(db.clone()));
    assert_eq!(cursors.read().await.get(), 12);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_garbage_cursor_reads_as_zero() {
    let (dir, path) = temp_db_path("garbage");

    let db = Database::open(&path).await.unwrap();
    db.set_preference(READ_CURSOR_KEY, "twelve").await.unwrap();
    let cursors = ReadCursorStore::new(Arc::new(db.clone()));
    assert_eq!(cursors.read().await, ReadCursor::ZERO);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_theme_survives_reopen() {
    let (dir, path) = temp_db_path("theme");

    {
        let db = Database::open(&path).await.unwrap();
        let themes = ThemePreference::new(Arc::new(db.clone()));
        themes.write(ThemeId::Emerald).await.unwrap();
    }

    let db = Database::open(&path).await.unwrap();
    let themes = ThemePreference::new(Arc::new(db.clone()));
    assert_eq!(themes.read(ThemeId::Cyan).await, ThemeId::Emerald);

    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(unix)]
#[tokio::test]
async fn test_database_file_is_user_only() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, path) = temp_db_path("perms");
    let _db = Database::open(&path).await.unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    std::fs::remove_dir_all(&dir).ok();
}
