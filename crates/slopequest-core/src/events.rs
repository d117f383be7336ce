//! # Telemetry Events
//!
//! Gameplay events the core reports to an external analytics collaborator.
//! The core only emits; what happens to an event is up to the [`EventSink`].

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// An attribute value attached to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValue {
    Int(u64),
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for EventValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A telemetry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    SessionStart { player_id: String },
    SessionEnd { player_id: String, total_score: u64 },
    LevelStart { level: u32, player_id: String },
    LevelComplete {
        level: u32,
        correct_answers: u64,
        wrong_answers: u64,
        score: u64,
        player_id: String,
    },
    QuestionAnswered {
        level: u32,
        /// Zero-based index of the question within its level.
        question_number: u32,
        is_correct: bool,
        player_id: String,
    },
}

impl GameEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStart { .. } => "game_session_start",
            Self::SessionEnd { .. } => "game_session_end",
            Self::LevelStart { .. } => "level_start",
            Self::LevelComplete { .. } => "level_complete",
            Self::QuestionAnswered { .. } => "question_answered",
        }
    }

    /// Attributes keyed by their wire names.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<&'static str, EventValue> {
        let player = |id: &str| ("playerID", EventValue::Text(id.to_string()));
        match self {
            Self::SessionStart { player_id } => BTreeMap::from([player(player_id)]),
            Self::SessionEnd {
                player_id,
                total_score,
            } => BTreeMap::from([
                player(player_id),
                ("totalScore", EventValue::Int(*total_score)),
            ]),
            Self::LevelStart { level, player_id } => BTreeMap::from([
                player(player_id),
                ("level", EventValue::Int(u64::from(*level))),
            ]),
            Self::LevelComplete {
                level,
                correct_answers,
                wrong_answers,
                score,
                player_id,
            } => BTreeMap::from([
                player(player_id),
                ("level", EventValue::Int(u64::from(*level))),
                ("correctAnswers", EventValue::Int(*correct_answers)),
                ("wrongAnswers", EventValue::Int(*wrong_answers)),
                ("score", EventValue::Int(*score)),
            ]),
            Self::QuestionAnswered {
                level,
                question_number,
                is_correct,
                player_id,
            } => BTreeMap::from([
                player(player_id),
                ("level", EventValue::Int(u64::from(*level))),
                ("questionNumber", EventValue::Int(u64::from(*question_number))),
                ("isCorrect", EventValue::Bool(*is_correct)),
            ]),
        }
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Receiver of telemetry events.
///
/// `emit` must not block gameplay; sinks that talk to a network should
/// queue internally.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &GameEvent);
}

/// Writes every event as an `info` log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &GameEvent) {
        let attributes = event
            .attributes()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(target: "slopequest::telemetry", event = event.name(), %attributes, "telemetry");
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GameEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<GameEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of recorded events, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(GameEvent::name)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &GameEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
