//! WebSocket handler for live round updates.
//!
//! Viewers connect per table and receive round events as JSON text frames:
//! round creation, dealt cards, betting cutoffs, winners, and throttled
//! aggregate bet totals. The stream is read-only; all mutation goes through
//! the HTTP API, so incoming frames other than pings and close are ignored.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws/1');
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   switch (data.type) {
//!     case 'card:dealt': renderCard(data); break;
//!     case 'winner:determined': showWinner(data); break;
//!     case 'round:stats': updateTotals(data); break;
//!   }
//! };
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{debug, info, warn};

use andar_bahar::TableId;

use super::AppState;
use crate::metrics;

/// Upgrade an HTTP connection to a WebSocket event stream for one table.
///
/// Returns `404 Not Found` when the table does not exist; otherwise the
/// connection is upgraded and events flow until either side disconnects.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<TableId>,
    State(state): State<AppState>,
) -> Response {
    if state.table_manager.get_table(table_id).await.is_err() {
        return (StatusCode::NOT_FOUND, "Unknown table").into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state, table_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, table_id: TableId) {
    let rooms = state.table_manager.rooms().clone();
    let (subscriber_id, mut events) = rooms.subscribe(table_id).await;
    info!("viewer {subscriber_id} connected to table {table_id}");
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(1.0);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    // Room dropped: the table was removed.
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("failed to serialize event for table {table_id}: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    // Read-only stream: any other client frame is dropped.
                    Some(Ok(other)) => {
                        debug!("ignoring client frame on table {table_id}: {other:?}");
                    }
                }
            }
        }
    }

    rooms.unsubscribe(table_id, subscriber_id).await;
    metrics::websocket_connections_active(-1.0);
    info!("viewer {subscriber_id} disconnected from table {table_id}");
}
