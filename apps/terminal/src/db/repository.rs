//! Key-value repository backing quiz progress.

use crate::db::error::DbError;
use crate::db::schema::{SCHEMA, SCHEMA_VERSION};
use chrono::Utc;
use quiz_core::{ProgressStore, QuizError};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open database at path, creating it and its directory if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn storage_error(e: DbError) -> QuizError {
    QuizError::Storage(e.to_string())
}

impl ProgressStore for SqliteStore {
    fn get(&self, key: &str) -> quiz_core::Result<Option<String>> {
        self.get_value(key).map_err(storage_error)
    }

    fn set(&mut self, key: &str, value: &str) -> quiz_core::Result<()> {
        self.set_value(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> quiz_core::Result<()> {
        self.remove_value(key).map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_get_remove() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(ProgressStore::get(&store, "hskQuizProgress").unwrap(), None);

        store.set("hskQuizProgress", "{\"version\":3}").unwrap();
        assert_eq!(
            ProgressStore::get(&store, "hskQuizProgress").unwrap().as_deref(),
            Some("{\"version\":3}")
        );

        store.set("hskQuizProgress", "{}").unwrap();
        assert_eq!(store.get_value("hskQuizProgress").unwrap().as_deref(), Some("{}"));

        store.remove("hskQuizProgress").unwrap();
        assert_eq!(store.get_value("hskQuizProgress").unwrap(), None);
    }

    #[test]
    fn test_remove_missing_key() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.remove("hsk4-progress").is_ok());
    }

    #[test]
    fn test_schema_version_recorded() {
        let store = SqliteStore::open_in_memory().unwrap();
        let version: i32 = store
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = std::env::temp_dir().join(format!("vocab-quiz-test-{}", std::process::id()));
        let path = dir.join("nested").join("progress.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_value("hskDeviceId", "device_1").unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get_value("hskDeviceId").unwrap().as_deref(), Some("device_1"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
