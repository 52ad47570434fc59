//! Multi-table Andar Bahar game server.
//!
//! Hosts live tables behind an HTTP/WebSocket API. The operator drives the
//! round lifecycle over REST; viewers follow rounds over a read-only
//! WebSocket stream.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;

use andar_bahar::{
    collab::{LoggingLedger, LoggingNotifier},
    SystemClock, TableManager,
};
use ab_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a multi-table Andar Bahar game server

USAGE:
  ab_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --tables     N           Number of tables to create  [default: env MAX_TABLES or 1]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                    Server bind address (e.g., 0.0.0.0:3000)
  METRICS_BIND                   Prometheus exporter bind address (disabled if unset)
  MAX_TABLES                     Number of tables to create on startup
  TABLE_MIN_BET                  Minimum bet in chips
  TABLE_CHIP_DENOMINATIONS       Comma-separated accepted chip amounts
  TABLE_ROUND_ONE_BETTING_SECS   First betting window length
  TABLE_ROUND_TWO_BETTING_SECS   Second betting window length
  BROADCAST_WINDOW_MS            Stats broadcast coalescing window
  LOCK_TIMEOUT_MS                Table lock acquisition timeout
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let num_tables_override: Option<usize> = pargs.opt_value_from_str("--tables")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, num_tables_override)?;
    info!("Starting Andar Bahar server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus metrics exported at http://{metrics_bind}/metrics");
    }

    let table_manager = Arc::new(TableManager::new(
        Arc::new(SystemClock),
        Arc::new(LoggingLedger),
        Arc::new(LoggingNotifier),
    ));

    info!("Creating {} initial table(s)...", config.num_tables);
    for i in 0..config.num_tables {
        let table_config = config
            .table_defaults
            .to_table_config(&format!("Table {}", i + 1));
        match table_manager.create_table(table_config).await {
            Ok(table) => info!("Created table {} ({})", table.id, table.config.name),
            Err(e) => log::error!("Failed to create table {}: {}", i + 1, e),
        }
    }

    let active_count = table_manager.active_table_count().await;
    metrics::active_tables(active_count);
    info!("Server ready with {active_count} active table(s)");

    for table in table_manager.list_tables().await {
        info!(
            "  - {} (ID: {}) - min bet {}, {} rounds played",
            table.name, table.id, table.min_bet, table.rounds_played
        );
    }

    let state = api::AppState {
        table_manager: table_manager.clone(),
    };
    let app = api::create_router(state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    table_manager.shutdown().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
