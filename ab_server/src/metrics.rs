//! Prometheus metrics for monitoring game server health.
//!
//! Metrics are exported on a dedicated scrape endpoint when `METRICS_BIND`
//! is configured.
//!
//! # Metric Categories
//!
//! - **Game Metrics**: bets placed, rounds created/settled, payout sizes
//! - **WebSocket Metrics**: active and total viewer connections

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on `addr`. Metrics become available at
/// `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

/// Increment bets placed, labelled by side.
pub fn bets_placed_total(side: &str) {
    metrics::counter!("bets_placed_total", "side" => side.to_string()).increment(1);
}

/// Increment rounds created.
pub fn rounds_created_total() {
    metrics::counter!("rounds_created_total").increment(1);
}

/// Increment rounds settled, labelled by terminal outcome.
pub fn rounds_settled_total(outcome: &str) {
    metrics::counter!("rounds_settled_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record the total payout of a settled round.
pub fn round_payout_chips(total: i64) {
    metrics::histogram!("round_payout_chips").record(total as f64);
}

/// Set current active tables count.
pub fn active_tables(count: usize) {
    metrics::gauge!("active_tables").set(count as f64);
}

/// Increment total WebSocket viewer connections.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Adjust the active WebSocket viewer gauge.
pub fn websocket_connections_active(delta: f64) {
    metrics::gauge!("websocket_connections_active").increment(delta);
}
