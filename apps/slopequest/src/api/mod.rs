//! # SlopeQuest HTTP API Module
//!
//! This module implements the HTTP REST API server using axum. A game client
//! drives one `GameSession` through it.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /profile` - Profile and current question state
//! - `POST /player` - Name the player (once)
//! - `POST /points` - Select the two points of the current question
//! - `POST /answer` - Submit a slope answer
//! - `POST /shop/buy` - Buy an item, or equip it if owned
//! - `POST /shop/select` - Equip an owned item
//! - `POST /shop/colored` - Unlock colored points
//! - `POST /settings` - Update haptic intensity / audio volume
//! - `POST /new-game` - Start over, keeping the name
//! - `POST /continue` - Reload and re-sync the saved game
//!
//! ## Security Configuration
//!
//! From `[server]` in the config file or the environment:
//! - `cors_origins` / `SLOPEQUEST_CORS_ORIGINS`: comma-separated origins, or "*" (default: localhost only)
//! - `rate_limit` / `SLOPEQUEST_RATE_LIMIT`: requests per second (default: 100, 0 to disable)
//! - `api_key` / `SLOPEQUEST_API_KEY`: if set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, key_matches};
pub use handlers::status_for;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    AnswerRequest, AnswerResponse, ContinueResponse, HealthResponse, NewGameResponse,
    PlayerRequest, PointsRequest, ProfileResponse, ProfileResult, SettingsRequest, ShopRequest,
    ShopResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use slopequest_core::{GameSession, QuizError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the game session.
#[derive(Clone)]
pub struct AppState {
    /// The one session; every request is serialized through this lock.
    pub session: Arc<Mutex<GameSession>>,
}

impl AppState {
    /// Create new app state with an initialized session.
    #[must_use]
    pub fn new(session: GameSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `"*"`: allows all origins (development only)
/// - `None`: localhost only
/// - otherwise: the listed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting - global request budget (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = build_cors_layer(server.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/profile", get(handlers::profile_handler))
        .route("/player", post(handlers::player_handler))
        .route("/points", post(handlers::points_handler))
        .route("/answer", post(handlers::answer_handler))
        .route("/shop/buy", post(handlers::shop_buy_handler))
        .route("/shop/select", post(handlers::shop_select_handler))
        .route("/shop/colored", post(handlers::shop_colored_handler))
        .route("/settings", post(handlers::settings_handler))
        .route("/new-game", post(handlers::new_game_handler))
        .route("/continue", post(handlers::continue_handler));

    match server.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            let key: ApiKey = Arc::from(key);
            router = router.layer(axum_middleware::from_fn_with_state(
                key,
                auth::api_key_auth_middleware,
            ));
        }
        None => tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set SLOPEQUEST_API_KEY to enable authentication."
        ),
    }

    if server.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", server.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(server.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(16 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `session` until Ctrl+C, then end the session.
///
/// The session is already initialized, so the listener never accepts a
/// request against a half-loaded profile.
pub async fn run_server(session: GameSession, server: &ServerConfig) -> Result<(), QuizError> {
    let state = AppState::new(session);
    let router = create_router(state.clone(), server);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| QuizError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("SlopeQuest HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| QuizError::IoError(format!("Server error: {}", e)))?;

    state.session.lock().await.end();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
