//! Table and round management API handlers.
//!
//! These endpoints drive the operator-facing round lifecycle:
//! - Listing and creating tables
//! - Opening a round from the dealer's opening card
//! - Accepting bets while a betting window is open
//! - Dealing cards until the round settles
//!
//! Cards travel on the wire as `[value, suit]` pairs, e.g. `[7, "club"]`.
//!
//! # Examples
//!
//! Open a round:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tables/1/rounds \
//!   -H "Content-Type: application/json" \
//!   -d '{"opening_card": [7, "club"]}'
//! ```
//!
//! Place a bet:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tables/1/bets \
//!   -H "Content-Type: application/json" \
//!   -d '{"user_id": 42, "side": "andar", "amount": 5000}'
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use andar_bahar::{
    game::ledger::Bet, game::payout::Settlement, Card, Chips, GameError, Phase, RoundSnapshot,
    Side, TableConfig, TableId, TableMetadata, UserId,
};

use super::AppState;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub name: Option<String>,
    pub min_bet: Option<Chips>,
    pub chip_denominations: Option<Vec<Chips>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTableResponse {
    pub id: TableId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoundRequest {
    pub opening_card: Card,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBetRequest {
    pub user_id: UserId,
    pub side: Side,
    pub amount: Chips,
}

#[derive(Debug, Deserialize)]
pub struct DealCardRequest {
    pub card: Card,
}

#[derive(Debug, Serialize)]
pub struct DealCardResponse {
    pub card: Card,
    pub side: Side,
    pub position: usize,
    pub is_winning_card: bool,
    pub phase: Phase,
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a game error onto the HTTP surface. Missing resources are 404,
/// rule violations that depend on current state are 409, malformed inputs
/// are 400, and a lock acquisition timeout is a retryable 503.
fn game_error(err: GameError) -> ApiError {
    let status = match err {
        GameError::TableNotFound | GameError::NoActiveRound => StatusCode::NOT_FOUND,
        GameError::BettingClosed
        | GameError::RoundInProgress
        | GameError::CardAlreadyUsed { .. }
        | GameError::PhaseMismatch { .. } => StatusCode::CONFLICT,
        GameError::InvalidBetAmount { .. } | GameError::InvalidCard { .. } => {
            StatusCode::BAD_REQUEST
        }
        GameError::ConcurrencyTimeout => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// List all active tables.
///
/// Returns `200 OK` with an array of table summaries including the current
/// round phase, if a round is live.
pub async fn list_tables(State(state): State<AppState>) -> Json<Vec<TableMetadata>> {
    Json(state.table_manager.list_tables().await)
}

/// Create a new table.
///
/// Optional fields fall back to the server's table defaults. Raising
/// `min_bet` without an explicit chip list keeps only the default
/// denominations at or above the new floor.
///
/// # Errors
///
/// - `400 Bad Request`: config fails validation
pub async fn create_table(
    State(state): State<AppState>,
    Json(request): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<CreateTableResponse>), ApiError> {
    let mut config = TableConfig::default();
    if let Some(name) = request.name {
        config.name = name;
    }
    if let Some(denominations) = request.chip_denominations {
        config.chip_denominations = denominations;
    } else if let Some(min_bet) = request.min_bet {
        // A raised floor without an explicit chip list prunes the default
        // denominations below it.
        config.chip_denominations.retain(|&d| d >= min_bet);
    }
    if let Some(min_bet) = request.min_bet {
        config.min_bet = min_bet;
    }

    let table = state
        .table_manager
        .create_table(config)
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;
    metrics::active_tables(state.table_manager.active_table_count().await);

    Ok((
        StatusCode::CREATED,
        Json(CreateTableResponse {
            id: table.id,
            name: table.config.name.clone(),
        }),
    ))
}

/// Get the current round snapshot for a table.
///
/// # Errors
///
/// - `404 Not Found`: unknown table, or no round has been opened yet
pub async fn get_round(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> Result<Json<RoundSnapshot>, ApiError> {
    let table = state
        .table_manager
        .get_table(table_id)
        .await
        .map_err(game_error)?;
    let snapshot = table.snapshot().await.map_err(game_error)?;
    Ok(Json(snapshot))
}

/// Open a new round from the dealer's opening card.
///
/// # Errors
///
/// - `404 Not Found`: unknown table
/// - `409 Conflict`: a round is still in progress
/// - `400 Bad Request`: the opening card is not a valid playing card
pub async fn create_round(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Json(request): Json<CreateRoundRequest>,
) -> Result<(StatusCode, Json<RoundSnapshot>), ApiError> {
    let table = state
        .table_manager
        .get_table(table_id)
        .await
        .map_err(game_error)?;
    let snapshot = table
        .create_round(request.opening_card)
        .await
        .map_err(game_error)?;
    metrics::rounds_created_total();
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Place a bet on the live round.
///
/// # Errors
///
/// - `404 Not Found`: unknown table, or no round is live
/// - `409 Conflict`: the betting window has closed
/// - `400 Bad Request`: amount below the minimum or off the chip list
pub async fn place_bet(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Json(request): Json<PlaceBetRequest>,
) -> Result<(StatusCode, Json<Bet>), ApiError> {
    let table = state
        .table_manager
        .get_table(table_id)
        .await
        .map_err(game_error)?;
    let bet = table
        .place_bet(request.user_id, request.side, request.amount)
        .await
        .map_err(game_error)?;
    metrics::bets_placed_total(&bet.side.to_string());
    Ok((StatusCode::CREATED, Json(bet)))
}

/// Deal a card into the live round.
///
/// When the deal settles the round (a rank match or deck exhaustion), the
/// response carries the settlement.
///
/// # Errors
///
/// - `404 Not Found`: unknown table, or no round is live
/// - `409 Conflict`: betting is still open, the round already ended, or
///   the card has already left the deck
/// - `400 Bad Request`: not a valid playing card
pub async fn deal_card(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Json(request): Json<DealCardRequest>,
) -> Result<Json<DealCardResponse>, ApiError> {
    let table = state
        .table_manager
        .get_table(table_id)
        .await
        .map_err(game_error)?;
    let outcome = table.deal_card(request.card).await.map_err(game_error)?;

    if let Some(settlement) = &outcome.settlement {
        metrics::rounds_settled_total(&outcome.phase_after.to_string());
        metrics::round_payout_chips(settlement.total_payout);
    }

    Ok(Json(DealCardResponse {
        card: outcome.card,
        side: outcome.side,
        position: outcome.position,
        is_winning_card: outcome.is_winning_card,
        phase: outcome.phase_after,
        settlement: outcome.settlement,
    }))
}
