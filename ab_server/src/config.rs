//! Server configuration.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration. CLI arguments override environment variables, which
//! override built-in defaults.

use std::net::SocketAddr;

use andar_bahar::{constants, Chips, TableConfig};

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP/WebSocket bind address.
    pub bind: SocketAddr,
    /// Prometheus exporter bind address, if metrics are enabled.
    pub metrics_bind: Option<SocketAddr>,
    /// Number of tables to create on startup.
    pub num_tables: usize,
    /// Defaults applied to every table created at startup.
    pub table_defaults: TableDefaultsConfig,
}

/// Default table parameters, loadable from the environment.
#[derive(Debug, Clone)]
pub struct TableDefaultsConfig {
    pub min_bet: Chips,
    pub chip_denominations: Vec<Chips>,
    pub round_one_betting_secs: u64,
    pub round_two_betting_secs: u64,
    pub throttle_window_ms: u64,
    pub lock_timeout_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables, with optional CLI
    /// overrides taking precedence.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but unparseable, or when
    /// the resulting table defaults fail validation.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        num_tables_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:3000"
                    .parse()
                    .expect("Default bind address is valid")
            });

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Not a valid socket address: {raw}"),
            })?),
            Err(_) => None,
        };

        let chip_denominations = match std::env::var("TABLE_CHIP_DENOMINATIONS") {
            Ok(raw) => parse_chip_list(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "TABLE_CHIP_DENOMINATIONS".to_string(),
                reason: format!("Expected comma-separated chip amounts, got: {raw}"),
            })?,
            Err(_) => constants::DEFAULT_CHIP_DENOMINATIONS.to_vec(),
        };

        let table_defaults = TableDefaultsConfig {
            min_bet: parse_env_or("TABLE_MIN_BET", constants::DEFAULT_MIN_BET),
            chip_denominations,
            round_one_betting_secs: parse_env_or(
                "TABLE_ROUND_ONE_BETTING_SECS",
                constants::ROUND_ONE_BETTING_SECS,
            ),
            round_two_betting_secs: parse_env_or(
                "TABLE_ROUND_TWO_BETTING_SECS",
                constants::ROUND_TWO_BETTING_SECS,
            ),
            throttle_window_ms: parse_env_or(
                "BROADCAST_WINDOW_MS",
                constants::DEFAULT_THROTTLE_WINDOW_MS,
            ),
            lock_timeout_ms: parse_env_or("LOCK_TIMEOUT_MS", constants::DEFAULT_LOCK_TIMEOUT_MS),
        };

        let num_tables = num_tables_override.unwrap_or_else(|| parse_env_or("MAX_TABLES", 1));

        let config = ServerConfig {
            bind,
            metrics_bind,
            num_tables,
            table_defaults,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_TABLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }
        // Table-level constraints live with the table config itself.
        self.table_defaults
            .to_table_config("startup")
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "TABLE_*".to_string(),
                reason,
            })
    }
}

impl TableDefaultsConfig {
    /// Materialize a table config with these defaults and the given name.
    pub fn to_table_config(&self, name: &str) -> TableConfig {
        TableConfig {
            name: name.to_string(),
            min_bet: self.min_bet,
            chip_denominations: self.chip_denominations.clone(),
            round_one_betting_secs: self.round_one_betting_secs,
            round_two_betting_secs: self.round_two_betting_secs,
            throttle_window_ms: self.throttle_window_ms,
            lock_timeout_ms: self.lock_timeout_ms,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with default fallback.
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_chip_list(raw: &str) -> Option<Vec<Chips>> {
    let chips: Vec<Chips> = raw
        .split(',')
        .map(|part| part.trim().parse().ok())
        .collect::<Option<_>>()?;
    if chips.is_empty() {
        None
    } else {
        Some(chips)
    }
}
