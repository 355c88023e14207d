//! SQLite-backed local cache.
//!
//! # Responsibility
//! - Persist the latest sync documents on this device.
//! - Serve as the offline fallback when the remote cannot be reached.
//!
//! # Invariants
//! - One row per key; `put` replaces the previous bytes.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::sync::blob::{LocalCache, StorageResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

pub struct SqliteLocalCache {
    conn: Mutex<Connection>,
}

impl SqliteLocalCache {
    /// Opens (or creates) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl LocalCache for SqliteLocalCache {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = conn
            .query_row("SELECT bytes FROM blobs WHERE key = ?1;", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(bytes)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO blobs (key, bytes, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                bytes = excluded.bytes,
                updated_at = excluded.updated_at;",
            params![key, bytes],
        )?;
        debug!(
            "event=cache_put module=sync status=ok bytes={}",
            bytes.len()
        );
        Ok(())
    }
}
