//! Error taxonomy for round-engine operations.
//!
//! Every variant is local and recoverable: a rejected operation leaves the
//! round state untouched, and a round only reaches a terminal state through
//! its two defined terminal transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    entities::{Card, Chips},
    round::Phase,
};

#[derive(Clone, Debug, Deserialize, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("betting is closed")]
    BettingClosed,
    #[error("bet of {amount} is not an accepted chip amount")]
    InvalidBetAmount { amount: Chips },
    #[error("card {card} was already dealt this round")]
    CardAlreadyUsed { card: Card },
    #[error("{card} is not a valid card")]
    InvalidCard { card: Card },
    #[error("action not allowed in phase {phase}")]
    PhaseMismatch { phase: Phase },
    #[error("a round is already in progress")]
    RoundInProgress,
    #[error("no active round")]
    NoActiveRound,
    #[error("timed out waiting for the table lock")]
    ConcurrencyTimeout,
    #[error("table not found")]
    TableNotFound,
}

impl GameError {
    /// Transient errors are safe for the caller to retry as-is; the rest
    /// need corrected input or a different phase.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrencyTimeout)
    }
}
