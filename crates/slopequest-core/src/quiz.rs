//! # Quiz Engine
//!
//! Computes the canonical slope for a pair of grid points, validates answers,
//! and drives the per-question attempt state machine.
//!
//! ```text
//! AwaitingPoints --(two points)--> AwaitingAnswer --(correct | out of attempts)--> Resolved
//!       ^                               |                                             |
//!       +-------(clear points)----------+                                             |
//!       +--------------------------(advance to next question)------------------------+
//! ```
//!
//! ## Rounding
//!
//! Level 1 expects whole numbers; the slope is rounded half-to-even. From
//! level 2 the slope is rounded half-to-even at two decimals. Answers compare
//! with a small relative tolerance, never exact float equality.

use crate::config::GameConfig;
use crate::events::{EventSink, GameEvent};
use crate::primitives::{
    ADVANCED_DECIMALS, ANSWER_TOLERANCE, FIRST_LEVEL, LEVEL_UP_NOTICE_LEVEL, MAX_ANSWER_LENGTH,
};
use crate::{GridPoint, ProgressState, QuizError};

// =============================================================================
// SLOPE MATH
// =============================================================================

/// The exact slope `dy / dx` of the line through `a` and `b`.
///
/// # Errors
///
/// `VerticalSlope` when both points share an x coordinate.
#[allow(clippy::float_arithmetic)]
pub fn exact_slope(a: GridPoint, b: GridPoint) -> Result<f64, QuizError> {
    let dx = i64::from(b.x) - i64::from(a.x);
    let dy = i64::from(b.y) - i64::from(a.y);
    if dx == 0 {
        return Err(QuizError::VerticalSlope);
    }
    // i64 -> f64 is exact for any difference of two i32 values.
    #[allow(clippy::cast_precision_loss)]
    let (dx, dy) = (dx as f64, dy as f64);
    Ok(dy / dx)
}

/// The slope the player is expected to enter at `level`.
#[allow(clippy::float_arithmetic)]
pub fn canonical_slope(level: u32, a: GridPoint, b: GridPoint) -> Result<f64, QuizError> {
    let exact = exact_slope(a, b)?;
    if level <= FIRST_LEVEL {
        Ok(exact.round_ties_even())
    } else {
        let scale = 10f64.powi(ADVANCED_DECIMALS);
        Ok((exact * scale).round_ties_even() / scale)
    }
}

/// Parse a raw answer for `level`.
///
/// Level 1 rejects any decimal point before parsing, so `"2.0"` is refused
/// even though it is numerically whole.
pub fn parse_answer(level: u32, raw: &str) -> Result<f64, QuizError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_ANSWER_LENGTH {
        return Err(QuizError::MalformedAnswer(truncate(trimmed)));
    }
    if level <= FIRST_LEVEL && trimmed.contains('.') {
        return Err(QuizError::DecimalNotAllowed);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(QuizError::MalformedAnswer(truncate(trimmed))),
    }
}

/// Compare a submitted answer with the canonical value.
#[allow(clippy::float_arithmetic)]
#[must_use]
pub fn answers_match(submitted: f64, canonical: f64) -> bool {
    let scale = 1f64.max(submitted.abs()).max(canonical.abs());
    (submitted - canonical).abs() <= ANSWER_TOLERANCE * scale
}

/// Render a slope for display: `2`, `-0.5`, `1.33`.
#[must_use]
pub fn format_slope(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

fn truncate(raw: &str) -> String {
    raw.chars().take(MAX_ANSWER_LENGTH).collect()
}

// =============================================================================
// ATTEMPT STATE MACHINE
// =============================================================================

/// Where the current question stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    AwaitingPoints,
    AwaitingAnswer,
    Resolved,
}

/// Points and remaining attempts for the question being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAttempt {
    point_a: Option<GridPoint>,
    point_b: Option<GridPoint>,
    attempts_remaining: u32,
    resolved: bool,
}

impl QuestionAttempt {
    #[must_use]
    pub fn new(attempts: u32) -> Self {
        Self {
            point_a: None,
            point_b: None,
            attempts_remaining: attempts,
            resolved: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        if self.resolved {
            QuestionPhase::Resolved
        } else if self.point_b.is_some() {
            QuestionPhase::AwaitingAnswer
        } else {
            QuestionPhase::AwaitingPoints
        }
    }

    #[must_use]
    pub fn points(&self) -> Option<(GridPoint, GridPoint)> {
        self.point_a.zip(self.point_b)
    }

    #[must_use]
    pub fn first_point(&self) -> Option<GridPoint> {
        self.point_a
    }

    #[must_use]
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Add one point. The first call sets A, the second sets B.
    pub fn place_point(&mut self, point: GridPoint) -> Result<QuestionPhase, QuizError> {
        match (self.phase(), self.point_a) {
            (QuestionPhase::AwaitingPoints, None) => self.point_a = Some(point),
            (QuestionPhase::AwaitingPoints, Some(_)) => self.point_b = Some(point),
            _ => return Err(QuizError::PointsAlreadySelected),
        }
        Ok(self.phase())
    }

    /// Set both points at once, replacing any current selection.
    ///
    /// Attempts already used on this question stay used.
    pub fn select_points(&mut self, a: GridPoint, b: GridPoint) -> Result<(), QuizError> {
        if self.resolved {
            return Err(QuizError::PointsAlreadySelected);
        }
        self.point_a = Some(a);
        self.point_b = Some(b);
        Ok(())
    }

    /// Drop the current selection so the player can pick again.
    pub fn clear_points(&mut self) {
        if !self.resolved {
            self.point_a = None;
            self.point_b = None;
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Where the player landed after a question resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AdvanceOutcome {
    pub level: u32,
    pub question: u32,
    /// The level that was just finished, if this advance crossed a boundary.
    pub completed_level: Option<u32>,
    /// The one-time level-up notice should be shown now.
    pub level_up_notice: bool,
}

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct {
        reward: u64,
        advance: AdvanceOutcome,
    },
    /// Wrong, with attempts to spare. The points stay selected.
    Retry { attempts_remaining: u32 },
    /// Wrong on the last attempt; the answer is revealed.
    Revealed {
        canonical: f64,
        advance: AdvanceOutcome,
    },
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }

    #[must_use]
    pub fn advance(&self) -> Option<&AdvanceOutcome> {
        match self {
            Self::Correct { advance, .. } | Self::Revealed { advance, .. } => Some(advance),
            Self::Retry { .. } => None,
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Applies answers to a [`ProgressState`] and reports telemetry.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    config: GameConfig,
    attempt: QuestionAttempt,
}

impl QuizEngine {
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let attempt = QuestionAttempt::new(config.attempts_per_question);
        Self { config, attempt }
    }

    #[must_use]
    pub fn attempt(&self) -> &QuestionAttempt {
        &self.attempt
    }

    pub fn attempt_mut(&mut self) -> &mut QuestionAttempt {
        &mut self.attempt
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        self.attempt.phase()
    }

    /// Start a fresh question: no points, full attempts.
    pub fn setup_question(&mut self) {
        self.attempt = QuestionAttempt::new(self.config.attempts_per_question);
    }

    /// Judge `raw` against the selected points.
    ///
    /// Input errors (`PointsIncomplete`, `DecimalNotAllowed`,
    /// `MalformedAnswer`, `VerticalSlope`) leave state and attempts untouched.
    pub fn submit_answer(
        &mut self,
        state: &mut ProgressState,
        events: &dyn EventSink,
        raw: &str,
    ) -> Result<AnswerOutcome, QuizError> {
        let Some((a, b)) = self.attempt.points().filter(|_| !self.attempt.resolved) else {
            return Err(QuizError::PointsIncomplete);
        };

        let level = state.current_level;
        let submitted = parse_answer(level, raw)?;
        let canonical = canonical_slope(level, a, b)?;
        let correct = answers_match(submitted, canonical);

        if !correct && self.attempt.attempts_remaining > 1 {
            self.attempt.attempts_remaining -= 1;
            tracing::debug!(
                level,
                attempts_remaining = self.attempt.attempts_remaining,
                "wrong answer"
            );
            return Ok(AnswerOutcome::Retry {
                attempts_remaining: self.attempt.attempts_remaining,
            });
        }

        self.attempt.resolved = true;
        self.attempt.attempts_remaining = self.attempt.attempts_remaining.saturating_sub(1);

        let reward = self.config.reward_for_level(level);
        if correct {
            state.score = state.score.saturating_add(reward);
            state.coins = state.coins.saturating_add(reward);
            state.correct_answers = state.correct_answers.saturating_add(1);
        } else {
            state.wrong_answers = state.wrong_answers.saturating_add(1);
        }

        events.emit(&GameEvent::QuestionAnswered {
            level,
            question_number: state.current_question,
            is_correct: correct,
            player_id: state.player_id.clone(),
        });

        let advance = self.advance_question(state, events);
        if correct {
            Ok(AnswerOutcome::Correct { reward, advance })
        } else {
            Ok(AnswerOutcome::Revealed { canonical, advance })
        }
    }

    /// Move to the next question, rolling over to the next level when the
    /// current one is complete.
    pub fn advance_question(
        &mut self,
        state: &mut ProgressState,
        events: &dyn EventSink,
    ) -> AdvanceOutcome {
        let mut completed_level = None;
        let mut level_up_notice = false;

        state.current_question = state.current_question.saturating_add(1);
        if state.current_question >= self.config.questions_per_level {
            let finished = state.current_level;
            events.emit(&GameEvent::LevelComplete {
                level: finished,
                correct_answers: state.correct_answers,
                wrong_answers: state.wrong_answers,
                score: state.score,
                player_id: state.player_id.clone(),
            });

            state.current_level = finished.saturating_add(1);
            state.current_question = 0;
            completed_level = Some(finished);

            events.emit(&GameEvent::LevelStart {
                level: state.current_level,
                player_id: state.player_id.clone(),
            });

            if state.current_level == LEVEL_UP_NOTICE_LEVEL && !state.level_up_notice_shown {
                state.level_up_notice_shown = true;
                level_up_notice = true;
            }
            tracing::info!(
                completed = finished,
                level = state.current_level,
                "level complete"
            );
        }

        self.setup_question();
        AdvanceOutcome {
            level: state.current_level,
            question: state.current_question,
            completed_level,
            level_up_notice,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
