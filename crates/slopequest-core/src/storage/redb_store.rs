//! # redb-backed Local Store
//!
//! A disk-backed `KeyValueStore` using the redb embedded database.
//!
//! Writes are staged in memory and committed in a single write transaction
//! by `save()`, so a crash between `set` and `save` loses the staged values
//! and never leaves a half-written profile behind. Reads see staged values
//! first.

use super::{KeyValueStore, StoredValue};
use crate::QuizError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Table for values: key string -> postcard-serialized `StoredValue`
const VALUES: TableDefinition<&str, &[u8]> = TableDefinition::new("values");

fn io_error(e: impl std::fmt::Display) -> QuizError {
    QuizError::IoError(e.to_string())
}

/// A disk-backed key-value store using redb.
pub struct RedbStore {
    db: Database,
    /// Staged writes; `None` marks a staged removal.
    pending: BTreeMap<String, Option<StoredValue>>,
    /// A `delete_all` is staged and applies before `pending`.
    pending_clear: bool,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("pending", &self.pending.len())
            .field("pending_clear", &self.pending_clear)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QuizError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        let write_txn = db.begin_write().map_err(io_error)?;
        let _ = write_txn.open_table(VALUES).map_err(io_error)?;
        write_txn.commit().map_err(io_error)?;

        Ok(Self {
            db,
            pending: BTreeMap::new(),
            pending_clear: false,
        })
    }

    /// Number of writes staged since the last `save()`.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn read_committed(&self, key: &str) -> Result<Option<StoredValue>, QuizError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(VALUES).map_err(io_error)?;
        let Some(raw) = table.get(key).map_err(io_error)? else {
            return Ok(None);
        };
        postcard::from_bytes(raw.value())
            .map(Some)
            .map_err(|e| QuizError::SerializationError(format!("key '{}': {}", key, e)))
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, QuizError> {
        if let Some(staged) = self.pending.get(key) {
            return Ok(staged.clone());
        }
        if self.pending_clear {
            return Ok(None);
        }
        self.read_committed(key)
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), QuizError> {
        self.pending.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), QuizError> {
        self.pending.insert(key.to_string(), None);
        Ok(())
    }

    fn save(&mut self) -> Result<(), QuizError> {
        if self.pending.is_empty() && !self.pending_clear {
            return Ok(());
        }

        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            if self.pending_clear {
                write_txn.delete_table(VALUES).map_err(io_error)?;
            }
            let mut table = write_txn.open_table(VALUES).map_err(io_error)?;
            for (key, staged) in &self.pending {
                match staged {
                    Some(value) => {
                        let bytes = postcard::to_stdvec(value)
                            .map_err(|e| QuizError::SerializationError(e.to_string()))?;
                        table.insert(key.as_str(), bytes.as_slice()).map_err(io_error)?;
                    }
                    None => {
                        table.remove(key.as_str()).map_err(io_error)?;
                    }
                }
            }
        }
        write_txn.commit().map_err(io_error)?;

        self.pending.clear();
        self.pending_clear = false;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<(), QuizError> {
        self.pending.clear();
        self.pending_clear = true;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
