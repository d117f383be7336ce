//! Integration tests for the SlopeQuest HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

#![allow(clippy::unwrap_used, clippy::panic, clippy::float_arithmetic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use serde_json::{Value, json};
use slopequest::api::{
    AppState, ContinueResponse, HealthResponse, NewGameResponse, ProfileResponse, ProfileResult,
    create_router,
};
use slopequest::config::ServerConfig;
use slopequest_core::{
    GameConfig, GameSession, MemoryRemoteStore, MemoryStore, OfflineRemoteStore, RecordingSink,
    RemoteDocument, RemoteProfileStore, RemoteValue, remote::fields,
};
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn test_server_config() -> ServerConfig {
    ServerConfig {
        rate_limit: 0,
        ..ServerConfig::default()
    }
}

fn start_session(remote: Arc<dyn RemoteProfileStore>) -> GameSession {
    GameSession::start(
        Box::new(MemoryStore::new()),
        remote,
        Arc::new(RecordingSink::new()),
        GameConfig::default(),
    )
    .unwrap()
}

/// Create a test server with a fresh offline session.
fn create_test_server() -> TestServer {
    let session = start_session(Arc::new(OfflineRemoteStore));
    let router = create_router(AppState::new(session), &test_server_config());
    TestServer::new(router).unwrap()
}

/// Create a test server backed by an in-memory remote store.
fn create_online_test_server(remote: &MemoryRemoteStore) -> TestServer {
    let session = start_session(Arc::new(remote.clone()));
    let router = create_router(AppState::new(session), &test_server_config());
    TestServer::new(router).unwrap()
}

async fn name_player(server: &TestServer, name: &str) {
    server
        .post("/player")
        .json(&json!({ "name": name }))
        .await
        .assert_status_ok();
}

async fn select(server: &TestServer, a: (i32, i32), b: (i32, i32)) {
    server
        .post("/points")
        .json(&json!({
            "a": { "x": a.0, "y": a.1 },
            "b": { "x": b.0, "y": b.1 }
        }))
        .await
        .assert_status_ok();
}

// =============================================================================
// HEALTH / PROFILE
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_fresh_profile() {
    let server = create_test_server();

    let response = server.get("/profile").await;

    response.assert_status_ok();
    let profile: ProfileResponse = response.json();
    assert!(profile.player_id.is_empty());
    assert_eq!(profile.level, 1);
    assert_eq!(profile.question, 0);
    assert_eq!(profile.coins, 0);
    assert_eq!(profile.selected_item, 0);
    assert!(profile.purchased_items.contains(&0));
    assert_eq!(profile.attempts_remaining, 3);
    assert!(!profile.online);
}

// =============================================================================
// PLAYER
// =============================================================================

#[tokio::test]
async fn test_player_is_named_once() {
    let server = create_test_server();

    let response = server.post("/player").json(&json!({ "name": "  Ada " })).await;
    response.assert_status_ok();
    let body: ProfileResult = response.json();
    assert_eq!(body.profile.unwrap().player_id, "Ada");

    let response = server.post("/player").json(&json!({ "name": "Grace" })).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: ProfileResult = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_blank_player_name_rejected() {
    let server = create_test_server();

    let response = server.post("/player").json(&json!({ "name": "   " })).await;

    response.assert_status_bad_request();
}

// =============================================================================
// QUIZ
// =============================================================================

#[tokio::test]
async fn test_correct_answer_scores() {
    let server = create_test_server();
    select(&server, (0, 0), (4, 8)).await;

    let response = server.post("/answer").json(&json!({ "answer": "2" })).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"]["result"], "correct");
    assert_eq!(body["outcome"]["reward"], 10);
    assert_eq!(body["profile"]["score"], 10);
    assert_eq!(body["profile"]["coins"], 10);
    assert_eq!(body["profile"]["question"], 1);
}

#[tokio::test]
async fn test_answer_without_points_rejected() {
    let server = create_test_server();

    let response = server.post("/answer").json(&json!({ "answer": "2" })).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_decimal_at_level_one_rejected() {
    let server = create_test_server();
    select(&server, (0, 0), (4, 8)).await;

    let response = server.post("/answer").json(&json!({ "answer": "2.0" })).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("whole number"));

    let profile: ProfileResponse = server.get("/profile").await.json();
    assert_eq!(profile.attempts_remaining, 3);
}

#[tokio::test]
async fn test_vertical_pair_rejected() {
    let server = create_test_server();
    select(&server, (2, 0), (2, 5)).await;

    let response = server.post("/answer").json(&json!({ "answer": "1" })).await;

    response.assert_status_bad_request();
    let profile: ProfileResponse = server.get("/profile").await.json();
    assert_eq!(profile.attempts_remaining, 3);
    assert_eq!(profile.wrong_answers, 0);
}

#[tokio::test]
async fn test_third_miss_reveals_slope() {
    let server = create_test_server();
    select(&server, (0, 0), (3, 7)).await;

    for left in [2, 1] {
        let body: Value = server
            .post("/answer")
            .json(&json!({ "answer": "1" }))
            .await
            .json();
        assert_eq!(body["outcome"]["result"], "retry");
        assert_eq!(body["outcome"]["attempts_remaining"], left);
    }

    let body: Value = server
        .post("/answer")
        .json(&json!({ "answer": "1" }))
        .await
        .json();
    assert_eq!(body["outcome"]["result"], "revealed");
    assert_eq!(body["revealed"], "2");
    assert_eq!(body["profile"]["wrong_answers"], 1);
    assert_eq!(body["profile"]["score"], 0);
}

#[tokio::test]
async fn test_oversized_answer_rejected() {
    let server = create_test_server();
    select(&server, (0, 0), (1, 1)).await;

    let response = server
        .post("/answer")
        .json(&json!({ "answer": "9".repeat(1024) }))
        .await;

    response.assert_status_bad_request();
}

// =============================================================================
// SHOP
// =============================================================================

#[tokio::test]
async fn test_shop_insufficient_funds() {
    let server = create_test_server();

    let response = server.post("/shop/buy").json(&json!({ "item": 2 })).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["outcome"]["result"], "insufficient_funds");
    assert_eq!(body["outcome"]["needed"], 10);
}

#[tokio::test]
async fn test_shop_purchase_after_earning() {
    let server = create_test_server();
    select(&server, (0, 0), (1, 3)).await;
    server
        .post("/answer")
        .json(&json!({ "answer": "3" }))
        .await
        .assert_status_ok();

    let body: Value = server
        .post("/shop/buy")
        .json(&json!({ "item": 2 }))
        .await
        .json();

    assert_eq!(body["success"], true);
    assert_eq!(body["outcome"]["result"], "purchased");
    assert_eq!(body["profile"]["coins"], 0);
    assert_eq!(body["profile"]["selected_item"], 2);
}

#[tokio::test]
async fn test_select_unowned_item_conflicts() {
    let server = create_test_server();

    let response = server.post("/shop/select").json(&json!({ "item": 3 })).await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_item_rejected() {
    let server = create_test_server();

    let response = server.post("/shop/buy").json(&json!({ "item": 99 })).await;

    response.assert_status_bad_request();
}

// =============================================================================
// SETTINGS / LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_settings_are_clamped() {
    let server = create_test_server();

    let body: ProfileResult = server
        .post("/settings")
        .json(&json!({ "haptic_intensity": 4.0, "audio_volume": 0.5 }))
        .await
        .json();

    let profile = body.profile.unwrap();
    assert!((profile.haptic_intensity - 1.0).abs() < f32::EPSILON);
    assert!((profile.audio_volume - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_new_game_keeps_name() {
    let server = create_test_server();
    name_player(&server, "Ada").await;
    select(&server, (0, 0), (1, 1)).await;
    server
        .post("/answer")
        .json(&json!({ "answer": "1" }))
        .await
        .assert_status_ok();

    let response = server.post("/new-game").await;

    response.assert_status_ok();
    let body: NewGameResponse = response.json();
    assert!(body.fresh_start);
    let profile = body.profile;
    assert_eq!(profile.player_id, "Ada");
    assert_eq!(profile.score, 0);
    assert_eq!(profile.question, 0);
}

#[tokio::test]
async fn test_continue_requires_player() {
    let server = create_test_server();

    let response = server.post("/continue").await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_continue_restores_remote_profile() {
    let remote = MemoryRemoteStore::new("acct-1");
    let mut doc = RemoteDocument::new();
    doc.insert(fields::NICKNAME, RemoteValue::Text("Ada".to_string()));
    doc.insert(fields::CURRENT_LEVEL, RemoteValue::Int(3));
    doc.insert(fields::SCORE, RemoteValue::Int(120));
    remote.put_document(doc);
    let server = create_online_test_server(&remote);

    let profile: ProfileResponse = server.get("/profile").await.json();
    assert_eq!(profile.player_id, "Ada");
    assert_eq!(profile.level, 3);
    assert!(profile.online);

    let response = server.post("/continue").await;
    response.assert_status_ok();
    let body: ContinueResponse = response.json();
    assert!(body.remote_found);
    assert!(body.remote_error.is_none());
    assert_eq!(body.profile.unwrap().score, 120);
}

#[tokio::test]
async fn test_continue_survives_remote_outage() {
    let remote = MemoryRemoteStore::new("acct-1");
    let server = create_online_test_server(&remote);
    name_player(&server, "Ada").await;
    remote.set_available(false);

    let response = server.post("/continue").await;

    response.assert_status_ok();
    let body: ContinueResponse = response.json();
    assert!(body.remote_error.is_some());
    assert_eq!(body.profile.unwrap().player_id, "Ada");
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

fn create_authed_server(key: &str) -> TestServer {
    let session = start_session(Arc::new(OfflineRemoteStore));
    let config = ServerConfig {
        api_key: Some(key.to_string()),
        ..test_server_config()
    };
    TestServer::new(create_router(AppState::new(session), &config)).unwrap()
}

#[tokio::test]
async fn test_auth_rejects_missing_key() {
    let server = create_authed_server("secret-key");

    server.get("/profile").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_rejects_wrong_key() {
    let server = create_authed_server("secret-key");

    let response = server
        .get("/profile")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong-key"),
        )
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_accepts_bearer_key() {
    let server = create_authed_server("secret-key");

    let response = server
        .get("/profile")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret-key"),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_health_skips_auth() {
    let server = create_authed_server("secret-key");

    server.get("/health").await.assert_status_ok();
}
