//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use serde::{Deserialize, Serialize};
use slopequest_core::{
    AnswerOutcome, GameSession, GridPoint, QuestionPhase, ShopOutcome, WriterStats,
    primitives::{MAX_ANSWER_LENGTH, MAX_PLAYER_NAME_LENGTH},
};
use std::collections::BTreeSet;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// PROFILE RESPONSE
// =============================================================================

/// Everything a client needs to draw the current screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub player_id: String,
    pub level: u32,
    pub question: u32,
    pub questions_per_level: u32,
    pub score: u64,
    pub coins: u64,
    pub correct_answers: u64,
    pub wrong_answers: u64,
    pub purchased_items: BTreeSet<u32>,
    pub selected_item: u32,
    pub colored_variant_purchased: bool,
    pub haptic_intensity: f32,
    pub audio_volume: f32,
    pub phase: QuestionPhase,
    pub point_a: Option<GridPoint>,
    pub point_b: Option<GridPoint>,
    pub attempts_remaining: u32,
    pub online: bool,
    pub remote: Option<WriterStats>,
}

impl ProfileResponse {
    #[must_use]
    pub fn from_session(session: &GameSession) -> Self {
        let state = session.state();
        let attempt = session.attempt();
        let points = attempt.points();
        Self {
            player_id: state.player_id().to_string(),
            level: state.current_level(),
            question: state.current_question(),
            questions_per_level: session.config().questions_per_level,
            score: state.score(),
            coins: state.coins(),
            correct_answers: state.correct_answers(),
            wrong_answers: state.wrong_answers(),
            purchased_items: state.purchased_items().clone(),
            selected_item: state.selected_item(),
            colored_variant_purchased: state.colored_variant_purchased(),
            haptic_intensity: state.settings().haptic_intensity,
            audio_volume: state.settings().audio_volume,
            phase: session.phase(),
            point_a: attempt.first_point(),
            point_b: points.map(|(_, b)| b),
            attempts_remaining: attempt.attempts_remaining(),
            online: session.is_online(),
            remote: session.remote_stats(),
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Name the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRequest {
    pub name: String,
}

impl PlayerRequest {
    /// Reject oversized payloads before they reach the session.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.len() > MAX_PLAYER_NAME_LENGTH * 4 {
            return Err(format!(
                "Name length {} bytes exceeds maximum {} characters",
                self.name.len(),
                MAX_PLAYER_NAME_LENGTH
            ));
        }
        Ok(())
    }
}

// =============================================================================
// POINTS / ANSWER
// =============================================================================

/// Select both points of the current question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsRequest {
    pub a: GridPoint,
    pub b: GridPoint,
}

/// Submit a raw answer string, exactly as typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

impl AnswerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.answer.len() > MAX_ANSWER_LENGTH * 4 {
            return Err(format!(
                "Answer length {} bytes exceeds maximum {}",
                self.answer.len(),
                MAX_ANSWER_LENGTH
            ));
        }
        Ok(())
    }
}

/// Answer submission response.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub success: bool,
    pub outcome: Option<AnswerOutcome>,
    /// Formatted canonical answer when it was revealed.
    pub revealed: Option<String>,
    pub level_up_notice: bool,
    pub error: Option<String>,
    pub profile: Option<ProfileResponse>,
}

impl AnswerResponse {
    pub fn success(outcome: AnswerOutcome, level_up_notice: bool, profile: ProfileResponse) -> Self {
        let revealed = match &outcome {
            AnswerOutcome::Revealed { canonical, .. } => {
                Some(slopequest_core::format_slope(*canonical))
            }
            _ => None,
        };
        Self {
            success: true,
            outcome: Some(outcome),
            revealed,
            level_up_notice,
            error: None,
            profile: Some(profile),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            revealed: None,
            level_up_notice: false,
            error: Some(msg.into()),
            profile: None,
        }
    }
}

// =============================================================================
// SHOP
// =============================================================================

/// Shop item click.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopRequest {
    pub item: u32,
}

/// Shop response.
#[derive(Debug, Clone, Serialize)]
pub struct ShopResponse {
    pub success: bool,
    pub outcome: Option<ShopOutcome>,
    pub error: Option<String>,
    pub profile: Option<ProfileResponse>,
}

impl ShopResponse {
    /// Insufficient funds is a valid outcome but not a success.
    pub fn from_outcome(outcome: ShopOutcome, profile: ProfileResponse) -> Self {
        Self {
            success: !matches!(outcome, ShopOutcome::InsufficientFunds { .. }),
            outcome: Some(outcome),
            error: None,
            profile: Some(profile),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            error: Some(msg.into()),
            profile: None,
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Update one or both device settings. Values are clamped to `[0, 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsRequest {
    pub haptic_intensity: Option<f32>,
    pub audio_volume: Option<f32>,
}

// =============================================================================
// GENERIC RESPONSES
// =============================================================================

/// Response for operations that only return the updated profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResult {
    pub success: bool,
    pub error: Option<String>,
    pub profile: Option<ProfileResponse>,
}

impl ProfileResult {
    pub fn success(profile: ProfileResponse) -> Self {
        Self {
            success: true,
            error: None,
            profile: Some(profile),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            profile: None,
        }
    }
}

/// New-game response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameResponse {
    pub success: bool,
    /// Set once per new game so the client shows the fresh-start screen.
    pub fresh_start: bool,
    pub profile: ProfileResponse,
}

/// Continue-game response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueResponse {
    pub success: bool,
    pub remote_found: bool,
    pub identity_restored: bool,
    /// Set when the remote profile could not be pulled; local data is used.
    pub remote_error: Option<String>,
    pub error: Option<String>,
    pub profile: Option<ProfileResponse>,
}

impl ContinueResponse {
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            remote_found: false,
            identity_restored: false,
            remote_error: None,
            error: Some(msg.into()),
            profile: None,
        }
    }
}
