//! Per-table configuration.

use serde::{Deserialize, Serialize};

use crate::game::{constants, entities::Chips, round::BetPolicy};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableConfig {
    pub name: String,
    pub min_bet: Chips,
    pub chip_denominations: Vec<Chips>,
    pub round_one_betting_secs: u64,
    pub round_two_betting_secs: u64,
    pub throttle_window_ms: u64,
    pub lock_timeout_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Andar Bahar".to_string(),
            min_bet: constants::DEFAULT_MIN_BET,
            chip_denominations: constants::DEFAULT_CHIP_DENOMINATIONS.to_vec(),
            round_one_betting_secs: constants::ROUND_ONE_BETTING_SECS,
            round_two_betting_secs: constants::ROUND_TWO_BETTING_SECS,
            throttle_window_ms: constants::DEFAULT_THROTTLE_WINDOW_MS,
            lock_timeout_ms: constants::DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("table name must not be empty".to_string());
        }
        if self.min_bet <= 0 {
            return Err(format!("min bet must be positive, got {}", self.min_bet));
        }
        if self.chip_denominations.is_empty() {
            return Err("at least one chip denomination is required".to_string());
        }
        if let Some(below) = self
            .chip_denominations
            .iter()
            .find(|&&d| d < self.min_bet)
        {
            return Err(format!(
                "chip denomination {} is below the minimum bet {}",
                below, self.min_bet
            ));
        }
        if self.round_one_betting_secs == 0 || self.round_two_betting_secs == 0 {
            return Err("betting windows must be non-zero".to_string());
        }
        if self.throttle_window_ms == 0 {
            return Err("throttle window must be non-zero".to_string());
        }
        if self.lock_timeout_ms == 0 {
            return Err("lock timeout must be non-zero".to_string());
        }
        Ok(())
    }

    pub fn bet_policy(&self) -> BetPolicy {
        BetPolicy {
            min_bet: self.min_bet,
            denominations: self.chip_denominations.clone(),
        }
    }

    pub fn round_one_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.round_one_betting_secs as i64)
    }

    pub fn round_two_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.round_two_betting_secs as i64)
    }

    pub fn throttle_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.throttle_window_ms)
    }

    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }
}
