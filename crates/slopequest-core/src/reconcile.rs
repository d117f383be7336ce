//! # Reconciliation Engine
//!
//! Keeps the local cache and the remote profile store consistent.
//!
//! ## Load policy
//!
//! 1. The local cache is the baseline (covers devices that were never online).
//! 2. If the remote account signs in and has a document, its progress
//!    counters (level, correct, wrong, score) override the local ones. The
//!    nickname is only adopted when the local identity is still empty.
//! 3. The merged profile is written back to the local cache.
//!
//! ## Save policy
//!
//! Every persist writes the full record locally and synchronously, then hands
//! a full snapshot to the [`RemoteWriter`]. Remote failures never roll back
//! local state.

use crate::config::GameConfig;
use crate::remote::{
    RemoteAccount, RemoteDocument, RemoteProfileStore, RemoteWriter, WriterStats, fields,
};
use crate::storage::{KeyValueStore, ProfileCache, ProfileSource};
use crate::{ProgressState, QuizError};
use std::sync::Arc;

// =============================================================================
// MERGE
// =============================================================================

/// What a remote merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// The remote document existed and had at least one field.
    pub remote_found: bool,
    /// The remote nickname became the local identity.
    pub identity_restored: bool,
    /// Remote fields that overwrote local values.
    pub applied: Vec<&'static str>,
    /// Remote fields present but rejected as invalid.
    pub ignored: Vec<&'static str>,
}

/// Merge a remote document into `state`.
///
/// Remote progress counters win when present and valid. A non-empty local
/// identity is never replaced.
pub fn merge_remote(state: &mut ProgressState, document: &RemoteDocument) -> MergeReport {
    let mut report = MergeReport {
        remote_found: !document.is_empty(),
        ..MergeReport::default()
    };
    if !report.remote_found {
        return report;
    }

    if !state.is_named() {
        if let Some(name) = document.get_text(fields::NICKNAME) {
            let name = name.trim();
            if !name.is_empty() {
                state.player_id = name.to_string();
                report.identity_restored = true;
            }
        }
    }

    if let Some(level) = document.get_int(fields::CURRENT_LEVEL) {
        match u32::try_from(level) {
            Ok(level) if level >= 1 => {
                state.current_level = level;
                report.applied.push(fields::CURRENT_LEVEL);
            }
            _ => report.ignored.push(fields::CURRENT_LEVEL),
        }
    }

    let counters: [(&'static str, &mut u64); 3] = [
        (fields::CORRECT_ANSWERS, &mut state.correct_answers),
        (fields::WRONG_ANSWERS, &mut state.wrong_answers),
        (fields::SCORE, &mut state.score),
    ];
    for (field, slot) in counters {
        if let Some(value) = document.get_int(field) {
            match u64::try_from(value) {
                Ok(value) => {
                    *slot = value;
                    report.applied.push(field);
                }
                Err(_) => report.ignored.push(field),
            }
        }
    }

    if !report.ignored.is_empty() {
        tracing::warn!(ignored = ?report.ignored, "remote profile had invalid fields");
    }
    report
}

// =============================================================================
// ENGINE
// =============================================================================

/// Connection state of the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLink {
    /// Signed in; snapshots are written for this account.
    Online(RemoteAccount),
    /// Not signed in yet, or the store could not be reached. Sign-in is
    /// retried on the next persist.
    Unreachable,
    /// Sign-in was rejected or sync is disabled; local-only for the session.
    LocalOnly,
}

/// Merges and persists the profile across the local cache and remote store.
pub struct ReconciliationEngine {
    local: Box<dyn KeyValueStore>,
    remote: Arc<dyn RemoteProfileStore>,
    writer: Option<RemoteWriter>,
    link: RemoteLink,
    questions_per_level: u32,
    item_count: u32,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("link", &self.link)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new(
        local: Box<dyn KeyValueStore>,
        remote: Arc<dyn RemoteProfileStore>,
        config: &GameConfig,
    ) -> Self {
        Self {
            local,
            remote,
            writer: None,
            link: RemoteLink::Unreachable,
            questions_per_level: config.questions_per_level,
            item_count: config.shop_item_count,
        }
    }

    /// Load, sign in, merge and write back.
    ///
    /// Never fails: an unreadable cache falls back to a first-launch profile
    /// and a remote problem falls back to local-only mode.
    pub fn initialize(&mut self) -> (ProgressState, MergeReport) {
        let (mut state, source) = self.load_local();

        self.connect();

        let report = match self.pull_remote(&mut state) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "remote profile load failed; continuing with local data");
                MergeReport::default()
            }
        };

        if source == ProfileSource::Legacy {
            if let Err(e) = ProfileCache::remove_legacy(self.local.as_mut(), self.item_count) {
                tracing::warn!(error = %e, "could not remove legacy profile keys");
            }
        }
        if let Err(e) = ProfileCache::store(self.local.as_mut(), &state) {
            tracing::error!(error = %e, "could not write merged profile to local cache");
        }

        tracing::info!(
            player = state.player_id(),
            level = state.current_level(),
            ?source,
            online = self.is_online(),
            remote_found = report.remote_found,
            "profile initialized"
        );
        (state, report)
    }

    /// Re-read the local cache.
    pub fn reload_local(&mut self) -> Result<ProgressState, QuizError> {
        ProfileCache::load(self.local.as_ref(), self.questions_per_level, self.item_count)
            .map(|(state, _)| state)
    }

    /// Merge the remote document into `state` and write the result locally.
    ///
    /// An offline engine tries to sign in once more first.
    pub fn sync_from_remote(&mut self, state: &mut ProgressState) -> Result<MergeReport, QuizError> {
        if !self.is_online() {
            self.connect();
        }
        let report = self.pull_remote(state)?;
        ProfileCache::store(self.local.as_mut(), state)?;
        Ok(report)
    }

    /// Queue a full snapshot for the remote store.
    ///
    /// An unreachable store gets one sign-in attempt first. No-op when
    /// local-only.
    pub fn sync_to_remote(&mut self, state: &ProgressState) {
        if self.link == RemoteLink::Unreachable {
            self.connect();
        }
        match (&self.link, &self.writer) {
            (RemoteLink::Online(account), Some(writer)) => {
                writer.submit(account.clone(), RemoteDocument::from_state(state));
            }
            _ => tracing::debug!("offline; remote snapshot skipped"),
        }
    }

    /// Write `state` locally (synchronously), then queue it remotely.
    pub fn persist(&mut self, state: &ProgressState) -> Result<(), QuizError> {
        let local = ProfileCache::store(self.local.as_mut(), state);
        self.sync_to_remote(state);
        local
    }

    /// Wipe the local cache, then persist `state` into it.
    pub fn reset_local(&mut self, state: &ProgressState) -> Result<(), QuizError> {
        self.local.delete_all()?;
        self.persist(state)
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self.link, RemoteLink::Online(_))
    }

    #[must_use]
    pub fn link(&self) -> &RemoteLink {
        &self.link
    }

    /// Writer counters, if a writer was started.
    #[must_use]
    pub fn writer_stats(&self) -> Option<WriterStats> {
        self.writer.as_ref().map(RemoteWriter::stats)
    }

    /// Block until queued remote writes have completed.
    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
    }

    fn load_local(&self) -> (ProgressState, ProfileSource) {
        match ProfileCache::load(self.local.as_ref(), self.questions_per_level, self.item_count) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(error = %e, "local profile unreadable; starting from defaults");
                (ProgressState::new(), ProfileSource::Empty)
            }
        }
    }

    fn connect(&mut self) {
        let account = match self.remote.authenticate() {
            Ok(account) => account,
            Err(e @ QuizError::AuthenticationFailed(_)) => {
                tracing::warn!(error = %e, "remote sign-in rejected; running local-only");
                self.link = RemoteLink::LocalOnly;
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote store unreachable; will retry on next save");
                self.link = RemoteLink::Unreachable;
                return;
            }
        };

        if self.writer.is_none() {
            match RemoteWriter::spawn(Arc::clone(&self.remote)) {
                Ok(writer) => self.writer = Some(writer),
                Err(e) => {
                    tracing::error!(error = %e, "running local-only");
                    self.link = RemoteLink::LocalOnly;
                    return;
                }
            }
        }

        tracing::info!(%account, "signed in to remote profile store");
        self.link = RemoteLink::Online(account);
    }

    fn pull_remote(&self, state: &mut ProgressState) -> Result<MergeReport, QuizError> {
        let RemoteLink::Online(account) = &self.link else {
            return Err(QuizError::RemoteUnavailable("not signed in".to_string()));
        };
        let document = self.remote.load_all(account)?;
        let report = merge_remote(state, &document);
        state.normalize(self.questions_per_level);
        Ok(report)
    }
}

// =============================================================================
// TESTS
// =============================================================================
