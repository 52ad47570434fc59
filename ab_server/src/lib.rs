//! Andar Bahar game server: HTTP/WebSocket API over the round engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
