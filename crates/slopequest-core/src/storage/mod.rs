//! # Local Storage
//!
//! The device-local key-value cache behind the player profile.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: in-process map, shared between clones (tests, demos)
//! - [`RedbStore`]: disk-backed, staged writes committed atomically by `save()`
//!
//! Both implement [`KeyValueStore`]. [`ProfileCache`] sits on top and maps the
//! whole `ProgressState` to one versioned record.

mod memory;
mod profile_cache;
mod redb_store;

pub use memory::MemoryStore;
pub use profile_cache::{ProfileCache, ProfileSource, legacy_keys};
pub use redb_store::RedbStore;

use crate::QuizError;
use serde::{Deserialize, Serialize};

// =============================================================================
// STORED VALUE
// =============================================================================

/// A scalar held by the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

// =============================================================================
// ERROR LOGGING HELPERS
// =============================================================================

/// Log a store read error and fall back to the caller's default.
///
/// Typed getters take a default the same way the original preference API
/// does, so a broken read degrades to first-launch values instead of failing.
fn log_and_default<T>(result: Result<T, QuizError>, key: &str, default: T) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "local store read failed, using default");
            default
        }
    }
}

// =============================================================================
// KEY VALUE STORE TRAIT
// =============================================================================

/// Durable scalar storage local to the device.
///
/// Writes made with `set` become durable once `save` returns. Implementations
/// may apply them earlier, but callers must not rely on that.
pub trait KeyValueStore: Send {
    /// Read a raw value.
    fn get(&self, key: &str) -> Result<Option<StoredValue>, QuizError>;

    /// Stage a value for `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), QuizError>;

    /// Stage removal of `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), QuizError>;

    /// Make all staged writes durable.
    fn save(&mut self) -> Result<(), QuizError>;

    /// Remove every key.
    fn delete_all(&mut self) -> Result<(), QuizError>;

    /// Check whether a key holds any value.
    fn contains(&self, key: &str) -> Result<bool, QuizError> {
        Ok(self.get(key)?.is_some())
    }

    /// Read an integer, or `default` if missing, of another type, or unreadable.
    fn get_int(&self, key: &str, default: i64) -> i64 {
        let value = self.get(key).map(|v| match v {
            Some(StoredValue::Int(i)) => i,
            _ => default,
        });
        log_and_default(value, key, default)
    }

    /// Read a float, or `default` if missing, of another type, or unreadable.
    fn get_float(&self, key: &str, default: f64) -> f64 {
        let value = self.get(key).map(|v| match v {
            Some(StoredValue::Float(f)) => f,
            _ => default,
        });
        log_and_default(value, key, default)
    }

    /// Read a string, or `default` if missing, of another type, or unreadable.
    fn get_string(&self, key: &str, default: &str) -> String {
        let value = self.get(key).map(|v| match v {
            Some(StoredValue::Text(s)) => s,
            _ => default.to_string(),
        });
        log_and_default(value, key, default.to_string())
    }

    /// Read a byte blob. Unlike the scalar getters, errors are returned.
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, QuizError> {
        match self.get(key)? {
            Some(StoredValue::Bytes(b)) => Ok(Some(b)),
            Some(_) => Err(QuizError::SerializationError(format!(
                "key '{}' does not hold bytes",
                key
            ))),
            None => Ok(None),
        }
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), QuizError> {
        self.set(key, StoredValue::Int(value))
    }

    fn set_float(&mut self, key: &str, value: f64) -> Result<(), QuizError> {
        self.set(key, StoredValue::Float(value))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), QuizError> {
        self.set(key, StoredValue::Text(value.to_string()))
    }

    fn set_bytes(&mut self, key: &str, value: Vec<u8>) -> Result<(), QuizError> {
        self.set(key, StoredValue::Bytes(value))
    }
}

// =============================================================================
// TESTS
// =============================================================================
