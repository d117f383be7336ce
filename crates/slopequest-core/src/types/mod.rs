//! # Core Type Definitions
//!
//! This module contains the data model shared by every SlopeQuest component:
//! - Grid coordinates picked by the player (`GridPoint`)
//! - Per-device preferences (`Settings`)
//! - The canonical player profile (`ProgressState`)
//! - Error types (`QuizError`)
//!
//! ## Invariants
//!
//! `ProgressState` fields are crate-private. Outside the crate the profile is
//! read-only; every mutation goes through `GameSession`, which keeps:
//! - `current_question < questions_per_level`
//! - the default item owned and the selected item owned
//! - coins non-negative (unsigned) and never decremented below zero
//! - a non-empty `player_id` never replaced

use crate::primitives::{DEFAULT_ITEM, FIRST_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// =============================================================================
// GRID POINT
// =============================================================================

/// An integer point on the quiz grid, relative to the placement origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Device preferences stored with the profile.
///
/// Both values live in `[0, 1]`; anything else is clamped on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub haptic_intensity: f32,
    pub audio_volume: f32,
}

impl Settings {
    /// Create settings, clamping both values into `[0, 1]`.
    #[must_use]
    pub fn new(haptic_intensity: f32, audio_volume: f32) -> Self {
        Self {
            haptic_intensity: clamp_unit(haptic_intensity),
            audio_volume: clamp_unit(audio_volume),
        }
    }

    /// Re-apply the `[0, 1]` clamp (used after decoding untrusted records).
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.haptic_intensity, self.audio_volume)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            haptic_intensity: 1.0,
            audio_volume: 1.0,
        }
    }
}

/// Clamp into `[0, 1]`; non-finite input falls back to full strength.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

// =============================================================================
// PROGRESS STATE
// =============================================================================

/// The canonical in-memory profile of one player.
///
/// Serialized as-is (behind a versioned header) into the local store, see
/// `formats::persistence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub(crate) player_id: String,
    pub(crate) current_level: u32,
    pub(crate) current_question: u32,
    pub(crate) score: u64,
    pub(crate) coins: u64,
    pub(crate) correct_answers: u64,
    pub(crate) wrong_answers: u64,
    pub(crate) purchased_items: BTreeSet<u32>,
    pub(crate) selected_item: u32,
    pub(crate) colored_variant_purchased: bool,
    pub(crate) level_up_notice_shown: bool,
    pub(crate) settings: Settings,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            player_id: String::new(),
            current_level: FIRST_LEVEL,
            current_question: 0,
            score: 0,
            coins: 0,
            correct_answers: 0,
            wrong_answers: 0,
            purchased_items: BTreeSet::from([DEFAULT_ITEM]),
            selected_item: DEFAULT_ITEM,
            colored_variant_purchased: false,
            level_up_notice_shown: false,
            settings: Settings::default(),
        }
    }
}

impl ProgressState {
    /// Create a first-launch profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Player identity; empty until the player picks a name.
    #[must_use]
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Whether a player name has been assigned.
    #[must_use]
    pub fn is_named(&self) -> bool {
        !self.player_id.is_empty()
    }

    #[must_use]
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// Zero-based index of the question within the current level.
    #[must_use]
    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn coins(&self) -> u64 {
        self.coins
    }

    #[must_use]
    pub fn correct_answers(&self) -> u64 {
        self.correct_answers
    }

    #[must_use]
    pub fn wrong_answers(&self) -> u64 {
        self.wrong_answers
    }

    /// Item indices the player owns, in ascending order.
    #[must_use]
    pub fn purchased_items(&self) -> &BTreeSet<u32> {
        &self.purchased_items
    }

    /// Check whether an item is owned.
    #[must_use]
    pub fn owns(&self, item: u32) -> bool {
        self.purchased_items.contains(&item)
    }

    #[must_use]
    pub fn selected_item(&self) -> u32 {
        self.selected_item
    }

    #[must_use]
    pub fn colored_variant_purchased(&self) -> bool {
        self.colored_variant_purchased
    }

    /// Whether the one-time level-up notice has already fired.
    #[must_use]
    pub fn level_up_notice_shown(&self) -> bool {
        self.level_up_notice_shown
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Restore every invariant after loading from an untrusted source.
    ///
    /// Returns `true` if anything had to be corrected.
    pub fn normalize(&mut self, questions_per_level: u32) -> bool {
        let before = self.clone();

        if self.current_level < FIRST_LEVEL {
            self.current_level = FIRST_LEVEL;
        }
        if questions_per_level > 0 && self.current_question >= questions_per_level {
            self.current_question = 0;
        }
        self.purchased_items.insert(DEFAULT_ITEM);
        if !self.purchased_items.contains(&self.selected_item) {
            self.selected_item = DEFAULT_ITEM;
        }
        self.player_id = self.player_id.trim().to_string();
        self.settings = self.settings.clamped();

        *self != before
    }

    /// Reset everything except identity and device settings.
    pub(crate) fn reset_for_new_game(&mut self) {
        *self = Self {
            player_id: std::mem::take(&mut self.player_id),
            settings: self.settings,
            ..Self::default()
        };
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the SlopeQuest core.
///
/// - No silent failures: fallible operations return `Result<T, QuizError>`
/// - Nothing here is fatal; the worst outcome is local-only persistence
/// - Input errors carry player-facing messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The submitted answer is not a number.
    #[error("Please enter a valid number.")]
    MalformedAnswer(String),

    /// A decimal answer was submitted on level 1.
    #[error("Enter a whole number only (no decimals).")]
    DecimalNotAllowed,

    /// The two points share an x coordinate.
    #[error("Vertical slope (undefined). Pick two different x positions.")]
    VerticalSlope,

    /// An answer was submitted before two points were selected.
    #[error("Please select two points.")]
    PointsIncomplete,

    /// A third point was placed on a question that already has two.
    #[error("Both points are already selected.")]
    PointsAlreadySelected,

    /// The item index is outside the shop catalog.
    #[error("Unknown shop item: {0}")]
    UnknownItem(u32),

    /// The item must be purchased before it can be selected.
    #[error("Item {0} is not owned")]
    ItemNotOwned(u32),

    /// The operation needs a named player.
    #[error("No player name has been set")]
    PlayerNotNamed,

    /// The player already has an identity; it is never reassigned.
    #[error("Player identity is already assigned: {0}")]
    IdentityAlreadyAssigned(String),

    /// The requested player name is empty or too long.
    #[error("Invalid player name: {0}")]
    InvalidPlayerName(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote account could not be signed in.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The remote profile store could not be reached.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The local store failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl QuizError {
    /// Whether this error is a recoverable mistake in player input.
    ///
    /// Input errors never change state and never consume an attempt.
    #[must_use]
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedAnswer(_)
                | Self::DecimalNotAllowed
                | Self::VerticalSlope
                | Self::PointsIncomplete
                | Self::PointsAlreadySelected
                | Self::UnknownItem(_)
                | Self::InvalidPlayerName(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
