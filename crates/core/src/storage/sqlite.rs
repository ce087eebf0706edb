//! SQLite-backed key-value store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::store::{KeyValueStore, StoreError};

/// SQLite-backed store with one `kv` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database file, creating it and the table if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(format!("connection lock poisoned: {}", e)))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| StoreError::Serialization {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        store.set("owned_tabs", &json!([3, 9])).unwrap();
        store.set("owned_tabs", &json!([9])).unwrap();
        assert_eq!(store.get("owned_tabs").unwrap(), Some(json!([9])));

        store.remove("owned_tabs").unwrap();
        assert!(store.get("owned_tabs").unwrap().is_none());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.set("test_mode", &json!(true)).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.get("test_mode").unwrap(), Some(json!(true)));
    }
}
