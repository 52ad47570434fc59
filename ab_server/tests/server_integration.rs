//! Integration tests for the HTTP API: table management, the round
//! lifecycle, and error mapping.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method

use ab_server::api::{create_router, AppState};
use andar_bahar::collab::{LoggingLedger, LoggingNotifier};
use andar_bahar::{ManualClock, TableConfig, TableManager};

/// Test server with a hand-advanced clock so betting windows can be walked
/// deterministically.
fn test_server() -> (axum::Router, Arc<TableManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let table_manager = Arc::new(TableManager::new(
        clock.clone(),
        Arc::new(LoggingLedger),
        Arc::new(LoggingNotifier),
    ));
    let app = create_router(AppState {
        table_manager: table_manager.clone(),
    });
    (app, table_manager, clock)
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_check_reports_active_tables() {
    let (app, manager, _clock) = test_server();
    manager.create_table(TableConfig::default()).await.unwrap();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tables"]["active_count"], 1);
}

#[tokio::test]
async fn create_and_list_tables() {
    let (app, _manager, _clock) = test_server();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tables",
        Some(json!({"name": "VIP", "min_bet": 2_500})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "VIP");
    let table_id = body["id"].as_u64().unwrap();

    let (status, body) = send(&app, Method::GET, "/api/v1/tables", None).await;
    assert_eq!(status, StatusCode::OK);
    let listing = body.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["id"], table_id);
    assert_eq!(listing[0]["min_bet"], 2_500);
    assert!(listing[0]["current_phase"].is_null());
}

#[tokio::test]
async fn raised_min_bet_prunes_default_chip_list() {
    let (app, _manager, _clock) = test_server();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables",
        Some(json!({"min_bet": 2_500})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    send(
        &app,
        Method::POST,
        "/api/v1/tables/1/rounds",
        Some(json!({"opening_card": [7, "club"]})),
    )
    .await;

    // The default 1_000 chip fell below the raised floor.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/bets",
        Some(json!({"user_id": 1, "side": "andar", "amount": 1_000})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/bets",
        Some(json!({"user_id": 1, "side": "andar", "amount": 2_500})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn invalid_table_config_rejected() {
    let (app, _manager, _clock) = test_server();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tables",
        Some(json!({"min_bet": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("min bet"));
}

#[tokio::test]
async fn round_lifecycle_over_http() {
    let (app, manager, clock) = test_server();
    manager.create_table(TableConfig::default()).await.unwrap();

    // No round yet.
    let (status, _) = send(&app, Method::GET, "/api/v1/tables/1/round", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Open a round with 7 of clubs.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/rounds",
        Some(json!({"opening_card": [7, "club"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"], json!({"betting": {"round_number": 1}}));

    // Opening a second round while this one is live conflicts.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/rounds",
        Some(json!({"opening_card": [9, "heart"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Bets while the window is open.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/bets",
        Some(json!({"user_id": 1, "side": "bahar", "amount": 5_000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");

    // Dealing is rejected while betting is open.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/deal",
        Some(json!({"card": [2, "spade"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Past both windows: betting closes, dealing opens.
    clock.advance(chrono::Duration::seconds(91));
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/bets",
        Some(json!({"user_id": 2, "side": "andar", "amount": 5_000})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // First card goes to bahar and happens to match the opening rank.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/deal",
        Some(json!({"card": [7, "diamond"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["side"], "bahar");
    assert_eq!(body["position"], 1);
    assert_eq!(body["is_winning_card"], true);
    assert_eq!(body["phase"], "complete");
    assert_eq!(body["settlement"]["total_payout"], 9_750);

    // Snapshot reflects the settled round.
    let (status, body) = send(&app, Method::GET, "/api/v1/tables/1/round", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winning_side"], "bahar");
    assert_eq!(body["total_payout"], 9_750);
}

#[tokio::test]
async fn invalid_bet_amount_is_a_bad_request() {
    let (app, manager, _clock) = test_server();
    manager.create_table(TableConfig::default()).await.unwrap();
    send(
        &app,
        Method::POST,
        "/api/v1/tables/1/rounds",
        Some(json!({"opening_card": [7, "club"]})),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tables/1/bets",
        Some(json!({"user_id": 1, "side": "andar", "amount": 1_234})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("1234"));
}

#[tokio::test]
async fn unknown_table_is_not_found() {
    let (app, _manager, _clock) = test_server();
    let (status, _) = send(&app, Method::GET, "/api/v1/tables/99/round", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/tables/99/bets",
        Some(json!({"user_id": 1, "side": "andar", "amount": 5_000})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
