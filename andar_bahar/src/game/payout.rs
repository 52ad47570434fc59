//! Settlement math.
//!
//! Computed exactly once at a round's terminal transition. The engine only
//! computes amounts; crediting balances belongs to the external balance
//! ledger collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    constants::{BONUS_MULTIPLIER, BONUS_POSITION, COMMISSION_PCT},
    entities::{Chips, Side, UserId},
    ledger::{BetLedger, BetStatus},
};

/// One bet's settled amount. `payout` is the full credit due back to the
/// user (stake plus net winnings for a win, the bare stake for a refund,
/// zero for a loss).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct UserPayout {
    pub user_id: UserId,
    pub bet_id: Uuid,
    pub stake: Chips,
    pub payout: Chips,
}

/// Result of settling a round, handed to the balance-ledger collaborator
/// after the critical section releases.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settlement {
    pub payouts: Vec<UserPayout>,
    pub total_payout: Chips,
}

/// Net payout for a winning bet given the winning card's 1-based position
/// within its side.
///
/// Positions 1-4 pay 1:1; position 5 pays 4:1 as a bonus tier. A match
/// deeper than 5 pays the base 1:1 tier. Either way a 5% commission comes
/// out of gross winnings, with integer math flooring the fraction.
pub fn winning_payout(stake: Chips, position: usize) -> Chips {
    let gross = if position == BONUS_POSITION {
        stake * BONUS_MULTIPLIER
    } else {
        stake
    };
    let net_winnings = gross * (100 - COMMISSION_PCT) / 100;
    stake + net_winnings
}

/// Settle a matched round: winning-side bets are paid per tier, losing-side
/// bets forfeit. Every bet's status transitions exactly once.
pub fn settle_win(ledger: &mut BetLedger, winning_side: Side, position: usize) -> Settlement {
    let mut payouts = Vec::with_capacity(ledger.len());
    let mut total = 0;
    for bet in ledger.bets_mut() {
        let payout = if bet.side == winning_side {
            bet.status = BetStatus::Won;
            winning_payout(bet.amount, position)
        } else {
            bet.status = BetStatus::Lost;
            0
        };
        total += payout;
        payouts.push(UserPayout {
            user_id: bet.user_id,
            bet_id: bet.id,
            stake: bet.amount,
            payout,
        });
    }
    Settlement {
        payouts,
        total_payout: total,
    }
}

/// Settle an exhausted deck: every bet on both sides refunds in full, no
/// commission.
pub fn settle_refund(ledger: &mut BetLedger) -> Settlement {
    let mut payouts = Vec::with_capacity(ledger.len());
    let mut total = 0;
    for bet in ledger.bets_mut() {
        bet.status = BetStatus::Refunded;
        total += bet.amount;
        payouts.push(UserPayout {
            user_id: bet.user_id,
            bet_id: bet.id,
            stake: bet.amount,
            payout: bet.amount,
        });
    }
    Settlement {
        payouts,
        total_payout: total,
    }
}
