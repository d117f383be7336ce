//! In-process remote stores for tests, demos and offline play.

use super::{RemoteAccount, RemoteDocument, RemoteProfileStore};
use crate::QuizError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct Inner {
    documents: BTreeMap<RemoteAccount, RemoteDocument>,
    available: bool,
    sign_in_fails: bool,
    write_delay: Option<Duration>,
    saves: Vec<RemoteDocument>,
}

/// A `RemoteProfileStore` held in memory.
///
/// Clones share the same documents, so a test can keep a handle to inspect
/// what the session wrote. Availability and sign-in can be toggled to
/// exercise the degraded paths.
#[derive(Debug, Clone)]
pub struct MemoryRemoteStore {
    account: RemoteAccount,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRemoteStore {
    /// Create a store that signs every session in as `account`.
    #[must_use]
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: RemoteAccount::new(account),
            inner: Arc::new(Mutex::new(Inner {
                documents: BTreeMap::new(),
                available: true,
                sign_in_fails: false,
                write_delay: None,
                saves: Vec::new(),
            })),
        }
    }

    /// The account this store signs in as.
    #[must_use]
    pub fn account(&self) -> &RemoteAccount {
        &self.account
    }

    /// Simulate the network going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Make `authenticate` fail.
    pub fn set_sign_in_fails(&self, fails: bool) {
        self.lock().sign_in_fails = fails;
    }

    /// Sleep this long inside every `force_save`.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.lock().write_delay = delay;
    }

    /// Seed the document for this store's account.
    pub fn put_document(&self, document: RemoteDocument) {
        let account = self.account.clone();
        self.lock().documents.insert(account, document);
    }

    /// Current document for this store's account.
    #[must_use]
    pub fn document(&self) -> Option<RemoteDocument> {
        self.lock().documents.get(&self.account).cloned()
    }

    /// Every document written so far, oldest first.
    #[must_use]
    pub fn saved_documents(&self) -> Vec<RemoteDocument> {
        self.lock().saves.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteProfileStore for MemoryRemoteStore {
    fn authenticate(&self) -> Result<RemoteAccount, QuizError> {
        let inner = self.lock();
        if inner.sign_in_fails {
            return Err(QuizError::AuthenticationFailed(
                "sign-in rejected".to_string(),
            ));
        }
        if !inner.available {
            return Err(QuizError::RemoteUnavailable("network down".to_string()));
        }
        Ok(self.account.clone())
    }

    fn load_all(&self, account: &RemoteAccount) -> Result<RemoteDocument, QuizError> {
        let inner = self.lock();
        if !inner.available {
            return Err(QuizError::RemoteUnavailable("network down".to_string()));
        }
        Ok(inner.documents.get(account).cloned().unwrap_or_default())
    }

    fn force_save(
        &self,
        account: &RemoteAccount,
        document: &RemoteDocument,
    ) -> Result<(), QuizError> {
        let delay = self.lock().write_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut inner = self.lock();
        if !inner.available {
            return Err(QuizError::RemoteUnavailable("network down".to_string()));
        }
        inner.documents.insert(account.clone(), document.clone());
        inner.saves.push(document.clone());
        Ok(())
    }
}

/// A remote store that is never reachable.
///
/// Used when the player opts out of sync; the session runs local-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemoteStore;

impl RemoteProfileStore for OfflineRemoteStore {
    fn authenticate(&self) -> Result<RemoteAccount, QuizError> {
        Err(QuizError::AuthenticationFailed(
            "remote sync disabled".to_string(),
        ))
    }

    fn load_all(&self, _account: &RemoteAccount) -> Result<RemoteDocument, QuizError> {
        Err(QuizError::RemoteUnavailable("remote sync disabled".to_string()))
    }

    fn force_save(
        &self,
        _account: &RemoteAccount,
        _document: &RemoteDocument,
    ) -> Result<(), QuizError> {
        Err(QuizError::RemoteUnavailable("remote sync disabled".to_string()))
    }
}
