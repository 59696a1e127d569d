//! SQLite implementation of the StateStore port.

use crate::ports::StateStore;
use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct SqliteStateStore {
    conn: Mutex<Connection>,
}

impl SqliteStateStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
        Self::with_connection(conn)
    }

    /// A throwaway database that lives as long as the store.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )
        .context("Failed to initialize database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Default database location in the user's data directory.
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Could not find data directory")?;
        Ok(data_dir.join("natter").join("state.db"))
    }

    /// Get current timestamp in milliseconds.
    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("state store connection lock poisoned"))
    }
}

impl StateStore for SqliteStateStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM slots WHERE key = ?1", (slot,), |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (slot, value, Self::now_ms()),
        )?;
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM slots WHERE key = ?1", (slot,))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = SqliteStateStore::in_memory().unwrap();
        assert_eq!(store.get("comment-state").unwrap(), None);

        store.set("comment-state", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("comment-state").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.set("comment-state", "{\"a\":2}").unwrap();
        assert_eq!(
            store.get("comment-state").unwrap().as_deref(),
            Some("{\"a\":2}")
        );

        store.remove("comment-state").unwrap();
        assert_eq!(store.get("comment-state").unwrap(), None);
        // Removing again is fine
        store.remove("comment-state").unwrap();
    }

    #[test]
    fn slots_are_independent() {
        let store = SqliteStateStore::in_memory().unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");
        {
            let store = SqliteStateStore::open(&path).unwrap();
            store.set("comment-state", "payload").unwrap();
        }
        let store = SqliteStateStore::open(&path).unwrap();
        assert_eq!(
            store.get("comment-state").unwrap().as_deref(),
            Some("payload")
        );
    }
}
