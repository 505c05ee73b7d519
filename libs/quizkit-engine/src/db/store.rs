//! Revisioned key-value store.
//!
//! Values are whole serialized records. Every write names the revision it
//! was based on; a write against a newer revision is rejected so concurrent
//! writers cannot silently overwrite each other.

use crate::db::error::DbError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// A stored value and the revision it was written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub revision: u64,
}

/// Scoped key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Write `value` if the current revision is `expected` (`None` means the
    /// key must be absent). Returns the new revision.
    fn put(&self, key: &str, value: &str, expected: Option<u64>) -> Result<u64>;

    /// Delete `key`. A later write starts above the removed revision.
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        Ok(())
    }

    fn current_revision(&self, key: &str) -> Result<Option<u64>> {
        self.conn
            .query_row(
                "SELECT revision FROM kv_store WHERE key = ?1 AND deleted = 0",
                params![key],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|rev| rev.map(|r| r as u64))
            .map_err(Into::into)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        self.conn
            .query_row(
                "SELECT value, revision FROM kv_store WHERE key = ?1 AND deleted = 0",
                params![key],
                |row| {
                    Ok(StoredValue {
                        value: row.get(0)?,
                        revision: row.get::<_, i64>(1)? as u64,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn put(&self, key: &str, value: &str, expected: Option<u64>) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let written = match expected {
            // A removed row is revived one revision past its tombstone
            None => self
                .conn
                .query_row(
                    "INSERT INTO kv_store (key, value, revision, updated_at) VALUES (?1, ?2, 1, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         revision = kv_store.revision + 1,
                         updated_at = excluded.updated_at,
                         deleted = 0
                     WHERE kv_store.deleted = 1
                     RETURNING revision",
                    params![key, value, now],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?,
            Some(rev) => self
                .conn
                .query_row(
                    "UPDATE kv_store SET value = ?1, revision = revision + 1, updated_at = ?2
                     WHERE key = ?3 AND revision = ?4 AND deleted = 0
                     RETURNING revision",
                    params![value, now, key, rev as i64],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?,
        };

        match written {
            Some(revision) => Ok(revision as u64),
            None => Err(DbError::StaleRevision {
                key: key.to_string(),
                expected,
                found: self.current_revision(key)?,
            }),
        }
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE kv_store SET value = '', revision = revision + 1, updated_at = ?1, deleted = 1
             WHERE key = ?2 AND deleted = 0",
            params![Utc::now().to_rfc3339(), key],
        )?;
        Ok(())
    }
}
