//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Input mistakes answer 400. Conflicts with the profile (already named, item
//! not owned, no player yet) answer 409. Remote failures answer 503.

use super::{
    AppState,
    types::{
        AnswerRequest, AnswerResponse, ContinueResponse, HealthResponse, NewGameResponse,
        PlayerRequest, PointsRequest, ProfileResponse, ProfileResult, SettingsRequest, ShopRequest,
        ShopResponse,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use slopequest_core::{MergeReport, QuizError};

/// HTTP status for a core error.
#[must_use]
pub fn status_for(error: &QuizError) -> StatusCode {
    match error {
        e if e.is_user_input() => StatusCode::BAD_REQUEST,
        QuizError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        QuizError::IdentityAlreadyAssigned(_)
        | QuizError::ItemNotOwned(_)
        | QuizError::PlayerNotNamed => StatusCode::CONFLICT,
        QuizError::RemoteUnavailable(_) | QuizError::AuthenticationFailed(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// HEALTH / PROFILE
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Current profile and question state.
pub async fn profile_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    (StatusCode::OK, Json(ProfileResponse::from_session(&session)))
}

// =============================================================================
// PLAYER HANDLER
// =============================================================================

/// Assign the player name (once).
pub async fn player_handler(
    State(state): State<AppState>,
    Json(request): Json<PlayerRequest>,
) -> impl IntoResponse {
    if let Err(msg) = request.validate() {
        return (StatusCode::BAD_REQUEST, Json(ProfileResult::error(msg)));
    }

    let mut session = state.session.lock().await;
    match session.name_player(&request.name) {
        Ok(()) => (
            StatusCode::OK,
            Json(ProfileResult::success(ProfileResponse::from_session(
                &session,
            ))),
        ),
        Err(e) => (status_for(&e), Json(ProfileResult::error(e.to_string()))),
    }
}

// =============================================================================
// QUIZ HANDLERS
// =============================================================================

/// Select both points of the current question.
pub async fn points_handler(
    State(state): State<AppState>,
    Json(request): Json<PointsRequest>,
) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    match session.select_points(request.a, request.b) {
        Ok(()) => (
            StatusCode::OK,
            Json(ProfileResult::success(ProfileResponse::from_session(
                &session,
            ))),
        ),
        Err(e) => (status_for(&e), Json(ProfileResult::error(e.to_string()))),
    }
}

/// Submit an answer for the selected points.
pub async fn answer_handler(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> impl IntoResponse {
    if let Err(msg) = request.validate() {
        return (StatusCode::BAD_REQUEST, Json(AnswerResponse::error(msg)));
    }

    let mut session = state.session.lock().await;
    match session.submit_answer(&request.answer) {
        Ok(outcome) => {
            let notice = session.take_level_notice();
            let profile = ProfileResponse::from_session(&session);
            (
                StatusCode::OK,
                Json(AnswerResponse::success(outcome, notice, profile)),
            )
        }
        Err(e) => (status_for(&e), Json(AnswerResponse::error(e.to_string()))),
    }
}

// =============================================================================
// SHOP HANDLERS
// =============================================================================

/// Shop click: buy an unowned item or equip an owned one.
pub async fn shop_buy_handler(
    State(state): State<AppState>,
    Json(request): Json<ShopRequest>,
) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    match session.buy_or_select(request.item) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ShopResponse::from_outcome(
                outcome,
                ProfileResponse::from_session(&session),
            )),
        ),
        Err(e) => (status_for(&e), Json(ShopResponse::error(e.to_string()))),
    }
}

/// Equip an owned item.
pub async fn shop_select_handler(
    State(state): State<AppState>,
    Json(request): Json<ShopRequest>,
) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    match session.select_item(request.item) {
        Ok(()) => (
            StatusCode::OK,
            Json(ProfileResult::success(ProfileResponse::from_session(
                &session,
            ))),
        ),
        Err(e) => (status_for(&e), Json(ProfileResult::error(e.to_string()))),
    }
}

/// Unlock colored points.
pub async fn shop_colored_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    let outcome = session.purchase_colored_variant();
    (
        StatusCode::OK,
        Json(ShopResponse::from_outcome(
            outcome,
            ProfileResponse::from_session(&session),
        )),
    )
}

// =============================================================================
// SETTINGS / LIFECYCLE HANDLERS
// =============================================================================

/// Update device settings.
pub async fn settings_handler(
    State(state): State<AppState>,
    Json(request): Json<SettingsRequest>,
) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    if let Some(value) = request.haptic_intensity {
        session.set_haptic_intensity(value);
    }
    if let Some(value) = request.audio_volume {
        session.set_audio_volume(value);
    }
    (
        StatusCode::OK,
        Json(ProfileResult::success(ProfileResponse::from_session(
            &session,
        ))),
    )
}

/// Start over, keeping the player name and settings.
pub async fn new_game_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    session.new_game();
    let fresh_start = session.take_fresh_start();
    (
        StatusCode::OK,
        Json(NewGameResponse {
            success: true,
            fresh_start,
            profile: ProfileResponse::from_session(&session),
        }),
    )
}

/// Resume: reload local progress and pull the remote profile.
pub async fn continue_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.lock().await;
    let (report, remote_error) = match session.continue_game() {
        Ok(report) => (report, None),
        Err(QuizError::PlayerNotNamed) => {
            let e = QuizError::PlayerNotNamed;
            return (status_for(&e), Json(ContinueResponse::error(e.to_string())));
        }
        Err(e) => {
            tracing::warn!(error = %e, "continue without remote profile");
            (MergeReport::default(), Some(e.to_string()))
        }
    };

    (
        StatusCode::OK,
        Json(ContinueResponse {
            success: true,
            remote_found: report.remote_found,
            identity_restored: report.identity_restored,
            remote_error,
            error: None,
            profile: Some(ProfileResponse::from_session(&session)),
        }),
    )
}
