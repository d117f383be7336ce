//! # Game Session
//!
//! The single entry point for a play session. Owns the profile, the quiz
//! engine, the shop ledger and the reconciliation engine, and serializes every
//! mutation through `&mut self`.
//!
//! A session only exists once [`GameSession::start`] has finished loading,
//! signing in and merging, so no quiz or shop call can observe a half-loaded
//! profile.

use crate::config::GameConfig;
use crate::events::{EventSink, GameEvent};
use crate::ledger::{PurchaseLedger, ShopOutcome};
use crate::primitives::MAX_PLAYER_NAME_LENGTH;
use crate::quiz::{AnswerOutcome, QuestionAttempt, QuestionPhase, QuizEngine};
use crate::reconcile::{MergeReport, ReconciliationEngine};
use crate::remote::{RemoteProfileStore, WriterStats};
use crate::storage::KeyValueStore;
use crate::types::clamp_unit;
use crate::{GridPoint, ProgressState, QuizError};
use std::sync::Arc;

/// A running play session.
pub struct GameSession {
    state: ProgressState,
    config: GameConfig,
    quiz: QuizEngine,
    ledger: PurchaseLedger,
    reconciler: ReconciliationEngine,
    events: Arc<dyn EventSink>,
    pending_level_notice: bool,
    fresh_start: bool,
    ended: bool,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("state", &self.state)
            .field("phase", &self.quiz.phase())
            .field("reconciler", &self.reconciler)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Load the profile, reconcile it with the remote store and open the
    /// first question.
    ///
    /// Only an invalid `config` is an error; storage and network problems
    /// degrade to defaults or local-only mode.
    pub fn start(
        local: Box<dyn KeyValueStore>,
        remote: Arc<dyn RemoteProfileStore>,
        events: Arc<dyn EventSink>,
        config: GameConfig,
    ) -> Result<Self, QuizError> {
        config.validate()?;

        let mut reconciler = ReconciliationEngine::new(local, remote, &config);
        let (state, _report) = reconciler.initialize();

        events.emit(&GameEvent::SessionStart {
            player_id: state.player_id.clone(),
        });

        let mut session = Self {
            state,
            quiz: QuizEngine::new(config.clone()),
            ledger: PurchaseLedger::new(&config),
            config,
            reconciler,
            events,
            pending_level_notice: false,
            fresh_start: false,
            ended: false,
        };
        session.quiz.setup_question();
        Ok(session)
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        self.quiz.phase()
    }

    #[must_use]
    pub fn attempt(&self) -> &QuestionAttempt {
        self.quiz.attempt()
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.reconciler.is_online()
    }

    #[must_use]
    pub fn remote_stats(&self) -> Option<WriterStats> {
        self.reconciler.writer_stats()
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    /// Assign the player's name. Allowed once.
    pub fn name_player(&mut self, name: &str) -> Result<(), QuizError> {
        if self.state.is_named() {
            return Err(QuizError::IdentityAlreadyAssigned(
                self.state.player_id.clone(),
            ));
        }
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_PLAYER_NAME_LENGTH {
            return Err(QuizError::InvalidPlayerName(name.to_string()));
        }
        self.state.player_id = name.to_string();
        tracing::info!(player = name, "player named");
        self.persist();
        Ok(())
    }

    // =========================================================================
    // QUIZ
    // =========================================================================

    pub fn place_point(&mut self, point: GridPoint) -> Result<QuestionPhase, QuizError> {
        self.quiz.attempt_mut().place_point(point)
    }

    pub fn select_points(&mut self, a: GridPoint, b: GridPoint) -> Result<(), QuizError> {
        self.quiz.attempt_mut().select_points(a, b)
    }

    pub fn clear_points(&mut self) {
        self.quiz.attempt_mut().clear_points();
    }

    /// Judge an answer for the selected points.
    ///
    /// A resolved question (correct or out of attempts) is persisted before
    /// this returns.
    pub fn submit_answer(&mut self, raw: &str) -> Result<AnswerOutcome, QuizError> {
        let outcome = self
            .quiz
            .submit_answer(&mut self.state, self.events.as_ref(), raw)?;
        if let Some(advance) = outcome.advance() {
            if advance.level_up_notice {
                self.pending_level_notice = true;
            }
            self.persist();
        }
        Ok(outcome)
    }

    /// The one-time level-up notice, if it fired and was not yet taken.
    pub fn take_level_notice(&mut self) -> bool {
        std::mem::take(&mut self.pending_level_notice)
    }

    // =========================================================================
    // SHOP
    // =========================================================================

    pub fn buy_or_select(&mut self, item: u32) -> Result<ShopOutcome, QuizError> {
        let outcome = self.ledger.buy_or_select(&mut self.state, item)?;
        if !matches!(outcome, ShopOutcome::InsufficientFunds { .. }) {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn select_item(&mut self, item: u32) -> Result<(), QuizError> {
        self.ledger.select(&mut self.state, item)?;
        self.persist();
        Ok(())
    }

    pub fn purchase_colored_variant(&mut self) -> ShopOutcome {
        let outcome = self.ledger.purchase_colored_variant(&mut self.state);
        if matches!(outcome, ShopOutcome::ColoredUnlocked { .. }) {
            self.persist();
        }
        outcome
    }

    /// Spend coins outside the catalog flow. Returns whether it succeeded.
    pub fn spend_coins(&mut self, amount: u64) -> bool {
        let spent = self.ledger.spend_coins(&mut self.state, amount);
        if spent {
            self.persist();
        }
        spent
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    pub fn set_haptic_intensity(&mut self, value: f32) {
        self.state.settings.haptic_intensity = clamp_unit(value);
        self.persist();
    }

    pub fn set_audio_volume(&mut self, value: f32) {
        self.state.settings.audio_volume = clamp_unit(value);
        self.persist();
    }

    // =========================================================================
    // GAME LIFECYCLE
    // =========================================================================

    /// Reset progress, purchases and the level-up notice. Identity and
    /// settings survive.
    pub fn new_game(&mut self) {
        self.state.reset_for_new_game();
        self.quiz.setup_question();
        self.pending_level_notice = false;
        self.fresh_start = true;

        if let Err(e) = self.reconciler.reset_local(&self.state) {
            tracing::error!(error = %e, "could not reset local profile");
        }
        tracing::info!(player = self.state.player_id(), "new game started");
        self.events.emit(&GameEvent::LevelStart {
            level: self.state.current_level,
            player_id: self.state.player_id.clone(),
        });
    }

    /// Whether a new game was just started and not yet presented.
    pub fn take_fresh_start(&mut self) -> bool {
        std::mem::take(&mut self.fresh_start)
    }

    /// Resume a saved game: reload the local cache, pull the remote profile
    /// and persist the merged result.
    ///
    /// A remote failure is reported but the local profile stays loaded.
    pub fn continue_game(&mut self) -> Result<MergeReport, QuizError> {
        if !self.state.is_named() {
            return Err(QuizError::PlayerNotNamed);
        }

        match self.reconciler.reload_local() {
            Ok(state) if state.is_named() => self.state = state,
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "local profile unreadable; keeping session state"),
        }
        self.quiz.setup_question();

        let report = self.reconciler.sync_from_remote(&mut self.state);
        self.persist();
        report
    }

    /// Wait for queued remote writes.
    pub fn flush_remote(&self) {
        self.reconciler.flush();
    }

    /// Report the session end and flush remote writes. Idempotent.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.events.emit(&GameEvent::SessionEnd {
            player_id: self.state.player_id.clone(),
            total_score: self.state.score,
        });
        self.reconciler.flush();
        tracing::info!(
            player = self.state.player_id(),
            score = self.state.score,
            "session ended"
        );
    }

    fn persist(&mut self) {
        if let Err(e) = self.reconciler.persist(&self.state) {
            tracing::error!(error = %e, "local profile write failed");
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.end();
    }
}

// =============================================================================
// TESTS
// =============================================================================
