//! Per-round bet ledger.
//!
//! The ledger is owned exclusively by the round state machine and only ever
//! mutated inside the table mutex's critical section. It keeps the ordered
//! list of accepted bets for settlement plus running per-side totals so the
//! aggregate stats broadcast never has to walk the bet list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::{Chips, Side, UserId};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Refunded,
}

/// An accepted bet. Immutable once created except for `status`, which
/// transitions away from `Pending` exactly once at settlement.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Bet {
    pub id: Uuid,
    pub user_id: UserId,
    pub side: Side,
    pub amount: Chips,
    pub status: BetStatus,
}

#[derive(Debug, Default)]
pub struct BetLedger {
    bets: Vec<Bet>,
    andar_total: Chips,
    bahar_total: Chips,
}

impl BetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted bet. Validation (phase, window, amount) has
    /// already happened in the state machine.
    pub fn add(&mut self, user_id: UserId, side: Side, amount: Chips) -> Bet {
        let bet = Bet {
            id: Uuid::new_v4(),
            user_id,
            side,
            amount,
            status: BetStatus::Pending,
        };
        match side {
            Side::Andar => self.andar_total += amount,
            Side::Bahar => self.bahar_total += amount,
        }
        self.bets.push(bet.clone());
        bet
    }

    pub fn total(&self, side: Side) -> Chips {
        match side {
            Side::Andar => self.andar_total,
            Side::Bahar => self.bahar_total,
        }
    }

    /// (andar, bahar) running totals.
    pub fn totals(&self) -> (Chips, Chips) {
        (self.andar_total, self.bahar_total)
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Bets in acceptance order.
    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    /// Consistent copy of the bets for settlement bookkeeping.
    pub fn snapshot_for_settlement(&self) -> Vec<Bet> {
        self.bets.clone()
    }

    pub(super) fn bets_mut(&mut self) -> &mut [Bet] {
        &mut self.bets
    }
}
