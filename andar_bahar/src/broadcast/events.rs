//! Outbound event payloads.
//!
//! One explicit variant per wire event, tagged by name. The immediate class
//! (round created, card dealt, betting closed, terminal outcomes) bypasses
//! the throttler; the aggregate stats event is the one worth coalescing.

use serde::{Deserialize, Serialize};

use crate::game::{
    entities::{Card, Chips, RoundId, Side},
    payout::UserPayout,
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RoundEvent {
    #[serde(rename = "round:created")]
    RoundCreated {
        round_id: RoundId,
        opening_card: Card,
        round_number: u8,
    },
    #[serde(rename = "card:dealt")]
    CardDealt {
        round_id: RoundId,
        card: Card,
        side: Side,
        position: usize,
        is_winning_card: bool,
    },
    #[serde(rename = "betting:closed")]
    BettingClosed { round_id: RoundId },
    #[serde(rename = "winner:determined")]
    WinnerDetermined {
        round_id: RoundId,
        winning_side: Side,
        winning_card: Card,
        payouts: Vec<UserPayout>,
    },
    #[serde(rename = "round:no_winner")]
    NoWinner {
        round_id: RoundId,
        refunds: Vec<UserPayout>,
    },
    #[serde(rename = "round:stats")]
    Stats {
        round_id: RoundId,
        /// Monotonic per-round ordering key, taken while the totals are
        /// read under the table lock. Lets the throttler discard a
        /// snapshot that was overtaken before it was published.
        seq: u64,
        total_andar_bets: Chips,
        total_bahar_bets: Chips,
    },
}

impl RoundEvent {
    /// Rare, high-value events skip the throttler; only the continuous
    /// aggregate-stats stream is coalesced.
    pub fn is_immediate(&self) -> bool {
        !matches!(self, Self::Stats { .. })
    }

    /// Ordering key for coalesced aggregate events; `None` for the
    /// immediate class. The sequence only orders snapshots of the same
    /// round.
    pub fn stats_order(&self) -> Option<(RoundId, u64)> {
        match self {
            Self::Stats { round_id, seq, .. } => Some((*round_id, *seq)),
            _ => None,
        }
    }
}
