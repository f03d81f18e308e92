//! Key/value cache table.

use std::path::Path;
use std::sync::Mutex;

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use habitline_core::cache::LocalCache;

use crate::errors::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// Durable [`LocalCache`] backed by a single-file SQLite database.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory cache; contents are lost on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl LocalCache for SqliteCache {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock().expect("cache connection lock");
        match conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Local cache read failed for key {}: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let conn = self.conn.lock().expect("cache connection lock");
        let result = conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        );
        if let Err(e) = result {
            warn!("Local cache write failed for key {}: {}", key, e);
        }
    }
}
