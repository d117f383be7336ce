//! # File Remote Store
//!
//! A `RemoteProfileStore` that keeps one JSON document per account in a
//! directory. It stands in for a cloud save service: the directory can live
//! on a network share or a synced folder.
//!
//! Writes go to a temporary file first and are renamed into place, so a crash
//! never leaves a half-written document.

use slopequest_core::{QuizError, RemoteAccount, RemoteDocument, RemoteProfileStore};
use std::path::{Path, PathBuf};

/// Maximum size of a remote document (64 KB).
const MAX_DOCUMENT_SIZE: u64 = 64 * 1024;

/// Directory-backed remote profile store.
#[derive(Debug, Clone)]
pub struct FileRemoteStore {
    dir: PathBuf,
    account: RemoteAccount,
}

impl FileRemoteStore {
    /// Create a store for `account` under `dir`.
    ///
    /// Account names are restricted to ASCII letters, digits, `-` and `_`
    /// so they are always safe file names.
    pub fn new(dir: impl Into<PathBuf>, account: &str) -> Result<Self, QuizError> {
        let valid = !account.is_empty()
            && account.len() <= 64
            && account
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(QuizError::InvalidConfig(format!(
                "remote account '{}' must be 1-64 characters of [A-Za-z0-9_-]",
                account
            )));
        }
        Ok(Self {
            dir: dir.into(),
            account: RemoteAccount::new(account),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, account: &RemoteAccount) -> PathBuf {
        self.dir.join(format!("{}.json", account.as_str()))
    }
}

impl RemoteProfileStore for FileRemoteStore {
    fn authenticate(&self) -> Result<RemoteAccount, QuizError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            QuizError::RemoteUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;
        Ok(self.account.clone())
    }

    fn load_all(&self, account: &RemoteAccount) -> Result<RemoteDocument, QuizError> {
        let path = self.document_path(account);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RemoteDocument::new());
            }
            Err(e) => {
                return Err(QuizError::RemoteUnavailable(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };
        if metadata.len() > MAX_DOCUMENT_SIZE {
            return Err(QuizError::SerializationError(format!(
                "remote document {} bytes exceeds maximum {} bytes",
                metadata.len(),
                MAX_DOCUMENT_SIZE
            )));
        }

        let data = std::fs::read(&path)
            .map_err(|e| QuizError::RemoteUnavailable(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&data)
            .map_err(|e| QuizError::SerializationError(format!("remote document: {}", e)))
    }

    fn force_save(
        &self,
        account: &RemoteAccount,
        document: &RemoteDocument,
    ) -> Result<(), QuizError> {
        let path = self.document_path(account);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(document)
            .map_err(|e| QuizError::SerializationError(e.to_string()))?;

        std::fs::write(&tmp, data)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|e| QuizError::RemoteUnavailable(format!("{}: {}", path.display(), e)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
