//! In-memory key-value store.

use super::{KeyValueStore, StoredValue};
use crate::QuizError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    values: BTreeMap<String, StoredValue>,
    saves: u64,
}

/// A `KeyValueStore` kept in process memory.
///
/// Clones share the same map, which lets a test "restart" a session against
/// the store a previous session wrote to.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed `save()` calls.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.lock().saves
    }

    /// Number of keys currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    /// Check whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, QuizError> {
        Ok(self.lock().values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), QuizError> {
        self.lock().values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), QuizError> {
        self.lock().values.remove(key);
        Ok(())
    }

    fn save(&mut self) -> Result<(), QuizError> {
        self.lock().saves += 1;
        Ok(())
    }

    fn delete_all(&mut self) -> Result<(), QuizError> {
        self.lock().values.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_values() {
        let mut store = MemoryStore::new();
        let observer = store.clone();

        store.set_int("Coins", 30).expect("set");
        store.save().expect("save");

        assert_eq!(observer.get_int("Coins", 0), 30);
        assert_eq!(observer.save_count(), 1);
    }

    #[test]
    fn delete_all_clears_everything() {
        let mut store = MemoryStore::new();
        store.set_int("Coins", 30).expect("set");
        store.set_string("PlayerID", "ada").expect("set");

        store.delete_all().expect("delete");

        assert!(store.is_empty());
    }
}
