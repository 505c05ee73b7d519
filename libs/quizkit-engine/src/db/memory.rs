//! In-memory store for tests and hosts without durable storage.

use crate::db::error::DbError;
use crate::db::store::{KeyValueStore, StoredValue};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Slot>>,
}

/// A key's latest revision; `value` is `None` once removed.
#[derive(Debug)]
struct Slot {
    value: Option<String>,
    revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, DbError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).and_then(|slot| {
            slot.value.as_ref().map(|value| StoredValue {
                value: value.clone(),
                revision: slot.revision,
            })
        }))
    }

    fn put(&self, key: &str, value: &str, expected: Option<u64>) -> Result<u64, DbError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = entries.get(key);
        let found = slot.filter(|s| s.value.is_some()).map(|s| s.revision);
        if found != expected {
            return Err(DbError::StaleRevision {
                key: key.to_string(),
                expected,
                found,
            });
        }

        // Counting continues past a removal so old revisions never come back
        let revision = slot.map_or(1, |s| s.revision + 1);
        entries.insert(
            key.to_string(),
            Slot {
                value: Some(value.to_string()),
                revision,
            },
        );
        Ok(revision)
    }

    fn remove(&self, key: &str) -> Result<(), DbError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = entries.get_mut(key) {
            if slot.value.take().is_some() {
                slot.revision += 1;
            }
        }
        Ok(())
    }
}
