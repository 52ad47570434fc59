//! HTTP/WebSocket API for the Andar Bahar game server.
//!
//! The server exposes a REST surface for the operator-driven round
//! lifecycle (open round, accept bets, deal cards) and a read-only
//! WebSocket stream that fans out live round events to viewers.
//!
//! # Endpoints Overview
//!
//! ## Tables
//! - `GET  /api/v1/tables` - List all tables
//! - `POST /api/v1/tables` - Create a table
//! - `GET  /api/v1/tables/{id}/round` - Current round snapshot
//! - `POST /api/v1/tables/{id}/rounds` - Open a new round
//! - `POST /api/v1/tables/{id}/bets` - Place a bet
//! - `POST /api/v1/tables/{id}/deal` - Deal a card
//!
//! ## WebSocket
//! - `GET /ws/{table_id}` - Read-only live event stream
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! Authentication and user identity are resolved upstream of this service;
//! requests carry the already-authenticated `user_id`.

pub mod tables;
pub mod websocket;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use andar_bahar::TableManager;

/// Application state shared across all HTTP handlers and WebSocket
/// connections. Cloned per request; cheap due to the Arc wrapper.
#[derive(Clone)]
pub struct AppState {
    pub table_manager: Arc<TableManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// CORS is configured permissively for development. In production,
/// configure appropriate origins, methods, and headers.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/tables", get(tables::list_tables).post(tables::create_table))
        .route("/tables/{table_id}/round", get(tables::get_round))
        .route("/tables/{table_id}/rounds", post(tables::create_round))
        .route("/tables/{table_id}/bets", post(tables::place_bet))
        .route("/tables/{table_id}/deal", post(tables::deal_card));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws/{table_id}", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","tables":{"active_count":1},"timestamp":"2026-08-30T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_count = state.table_manager.active_table_count().await;

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "active_count": active_count,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
