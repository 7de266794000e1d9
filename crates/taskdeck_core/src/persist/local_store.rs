//! Local key/value slot and snapshot channel.
//!
//! # Responsibility
//! - Define the key/value store contract used for local durability.
//! - Provide SQLite-backed and in-memory implementations.
//! - Save/load full task snapshots under one fixed key.
//!
//! # Invariants
//! - Loading never fails: absent or malformed slots yield an empty list.
//! - Several sessions may share one slot; the last write wins.

use crate::db::{open_db, open_db_in_memory};
use crate::model::task::Task;
use crate::persist::error::{PersistError, PersistResult};
use crate::persist::snapshot;
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Minimal string key/value storage contract.
pub trait KeyValueStore: Send {
    fn get_item(&self, key: &str) -> PersistResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> PersistResult<()>;
    fn remove_item(&self, key: &str) -> PersistResult<()>;
}

/// SQLite-backed key/value store.
///
/// Sessions that open the same database file share every slot.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> PersistResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> PersistResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> PersistResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local key/value store.
///
/// Clones share the same slots. An optional quota rejects writes whose
/// total stored size would exceed the limit.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> PersistResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| PersistError::Storage("local slot lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> PersistResult<()> {
        let mut slots = self.lock()?;
        if let Some(quota) = self.quota_bytes {
            let others = slots
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum::<usize>();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(PersistError::Storage(format!(
                    "quota exceeded: {needed} bytes needed, {quota} allowed"
                )));
            }
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> PersistResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Result of reading the local slot.
///
/// `error` carries a recoverable failure (malformed content or unreadable
/// slot); `tasks` is empty in that case.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub tasks: Vec<Task>,
    pub error: Option<PersistError>,
}

/// Full-snapshot channel over one key of a key/value store.
pub struct LocalSnapshotStore<K: KeyValueStore> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> LocalSnapshotStore<K> {
    pub fn new(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying key/value store.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Writes the whole list to the slot.
    ///
    /// # Errors
    /// - Storage-class errors when the backing store rejects the write.
    pub fn save(&self, tasks: &[Task]) -> PersistResult<()> {
        let started_at = Instant::now();
        let encoded = snapshot::encode_compact(tasks)?;
        match self.kv.set_item(&self.key, &encoded) {
            Ok(()) => {
                debug!(
                    "event=local_save module=persist status=ok count={} bytes={} duration_ms={}",
                    tasks.len(),
                    encoded.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=local_save module=persist status=error count={} error={}",
                    tasks.len(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Reads the slot, swallowing absent or malformed content.
    pub fn load(&self) -> LoadOutcome {
        let raw = match self.kv.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("event=local_load module=persist status=empty");
                return LoadOutcome::default();
            }
            Err(err) => {
                error!("event=local_load module=persist status=error error={err}");
                return LoadOutcome {
                    tasks: Vec::new(),
                    error: Some(err),
                };
            }
        };

        match snapshot::decode(&raw) {
            Ok(tasks) => {
                info!(
                    "event=local_load module=persist status=ok count={}",
                    tasks.len()
                );
                LoadOutcome { tasks, error: None }
            }
            Err(err) => {
                warn!("event=local_load module=persist status=malformed error={err}");
                LoadOutcome {
                    tasks: Vec::new(),
                    error: Some(PersistError::Storage(format!("local slot unreadable: {err}"))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, LocalSnapshotStore, MemoryKeyValueStore, SqliteKeyValueStore};
    use crate::persist::error::PersistError;

    #[test]
    fn sqlite_slot_upserts_and_removes() {
        let kv = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(kv.get_item("k").unwrap(), None);
        kv.set_item("k", "one").unwrap();
        kv.set_item("k", "two").unwrap();
        assert_eq!(kv.get_item("k").unwrap().as_deref(), Some("two"));
        kv.remove_item("k").unwrap();
        assert_eq!(kv.get_item("k").unwrap(), None);
    }

    #[test]
    fn memory_quota_rejects_oversized_write_and_keeps_previous_value() {
        let kv = MemoryKeyValueStore::with_quota(8);
        kv.set_item("k", "[]").unwrap();
        let err = kv.set_item("k", "0123456789").unwrap_err();
        assert!(matches!(err, PersistError::Storage(ref m) if m.contains("quota")));
        assert_eq!(kv.get_item("k").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn load_of_absent_slot_is_empty_without_error() {
        let store = LocalSnapshotStore::new(MemoryKeyValueStore::new(), "tasks");
        let outcome = store.load();
        assert!(outcome.tasks.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn load_of_malformed_slot_reports_storage_error() {
        for raw in [r#"{"id":1}"#, "{not json"] {
            let kv = MemoryKeyValueStore::new();
            kv.set_item("tasks", raw).unwrap();
            let outcome = LocalSnapshotStore::new(kv, "tasks").load();
            assert!(outcome.tasks.is_empty());
            let err = outcome.error.expect("malformed slot reports an error");
            assert!(err.is_storage(), "{err}");
            assert!(matches!(err, PersistError::Storage(ref m) if m.contains("invalid task data")));
        }
    }
}
