//! # Remote Profile Store
//!
//! The durable, network-side copy of a player's progress.
//!
//! The core never talks to a network directly. It goes through
//! [`RemoteProfileStore`], a document store keyed by the signed-in account.
//! Writes are funnelled through [`RemoteWriter`] so that gameplay never waits
//! on the network and snapshots reach the store in the order they were taken.

mod memory;
mod writer;

pub use memory::{MemoryRemoteStore, OfflineRemoteStore};
pub use writer::{RemoteWriter, WriterStats};

use crate::{ProgressState, QuizError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names of the remote profile document.
pub mod fields {
    pub const NICKNAME: &str = "nickname";
    pub const CURRENT_LEVEL: &str = "currentLevel";
    pub const CORRECT_ANSWERS: &str = "correctAnswers";
    pub const WRONG_ANSWERS: &str = "wrongAnswers";
    pub const SCORE: &str = "score";
}

// =============================================================================
// ACCOUNT
// =============================================================================

/// Identity of the signed-in remote account.
///
/// This is the storage key for the document. It is distinct from the player's
/// chosen name, which travels inside the document as `nickname`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RemoteAccount(pub String);

impl RemoteAccount {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// A single field value in a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteValue {
    Int(i64),
    Text(String),
}

/// A full remote profile document: field name -> value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteDocument {
    values: BTreeMap<String, RemoteValue>,
}

impl RemoteDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the remotely tracked fields of a profile.
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        let mut doc = Self::new();
        doc.insert(fields::NICKNAME, RemoteValue::Text(state.player_id.clone()));
        doc.insert(fields::CURRENT_LEVEL, int_value(u64::from(state.current_level)));
        doc.insert(fields::CORRECT_ANSWERS, int_value(state.correct_answers));
        doc.insert(fields::WRONG_ANSWERS, int_value(state.wrong_answers));
        doc.insert(fields::SCORE, int_value(state.score));
        doc
    }

    pub fn insert(&mut self, field: &str, value: RemoteValue) {
        self.values.insert(field.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RemoteValue> {
        self.values.get(field)
    }

    /// Read a field as an integer. Numeric strings are accepted.
    #[must_use]
    pub fn get_int(&self, field: &str) -> Option<i64> {
        match self.values.get(field)? {
            RemoteValue::Int(i) => Some(*i),
            RemoteValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Read a field as text. Integers are rendered in decimal.
    #[must_use]
    pub fn get_text(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            RemoteValue::Int(i) => Some(i.to_string()),
            RemoteValue::Text(s) => Some(s.clone()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

fn int_value(v: u64) -> RemoteValue {
    RemoteValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
}

// =============================================================================
// REMOTE STORE TRAIT
// =============================================================================

/// A remote document store holding one profile document per account.
///
/// Implementations must be shareable with the background writer thread.
pub trait RemoteProfileStore: Send + Sync {
    /// Sign in and return the account the documents are keyed by.
    ///
    /// Failure puts the session in local-only mode.
    fn authenticate(&self) -> Result<RemoteAccount, QuizError>;

    /// Load the full document. A missing document is an empty one.
    fn load_all(&self, account: &RemoteAccount) -> Result<RemoteDocument, QuizError>;

    /// Replace the stored document with `document` (last write wins).
    fn force_save(&self, account: &RemoteAccount, document: &RemoteDocument)
    -> Result<(), QuizError>;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_carries_progress_fields() {
        let mut state = ProgressState::new();
        state.player_id = "ada".to_string();
        state.current_level = 3;
        state.score = 90;
        state.coins = 500;

        let doc = RemoteDocument::from_state(&state);

        assert_eq!(doc.get_text(fields::NICKNAME).as_deref(), Some("ada"));
        assert_eq!(doc.get_int(fields::CURRENT_LEVEL), Some(3));
        assert_eq!(doc.get_int(fields::SCORE), Some(90));
        assert_eq!(doc.len(), 5);
    }

    #[test]
    fn numeric_text_reads_as_int() {
        let mut doc = RemoteDocument::new();
        doc.insert(fields::SCORE, RemoteValue::Text(" 42 ".to_string()));
        doc.insert(fields::NICKNAME, RemoteValue::Text("ada".to_string()));

        assert_eq!(doc.get_int(fields::SCORE), Some(42));
        assert_eq!(doc.get_int(fields::NICKNAME), None);
    }
}
