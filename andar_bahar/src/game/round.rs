//! The round state machine.
//!
//! A round owns its phase, betting windows, card sequences, and bet ledger.
//! It is a purely synchronous value: every mutating method runs inside the
//! owning table's mutex critical section, and window expiry is evaluated by
//! wall-clock comparison against a caller-supplied `now` rather than by
//! scheduled timers, so the whole lifecycle is testable with an injected
//! clock.
//!
//! Phases: `betting(1)` → `betting(2)` → `dealing` → `complete` |
//! `no_winner`. Rounds 1 and 2 are betting-only; cards are dealt only in
//! round 3. Bahar always receives the first card, then sides alternate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{
    constants,
    entities::{Card, Chips, RoundId, Side, UsedCards, UserId},
    errors::GameError,
    ledger::{Bet, BetLedger},
    payout::{self, Settlement},
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Betting { round_number: u8 },
    Dealing,
    Complete,
    NoWinner,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::NoWinner)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Betting { round_number } => write!(f, "betting({round_number})"),
            Self::Dealing => write!(f, "dealing"),
            Self::Complete => write!(f, "complete"),
            Self::NoWinner => write!(f, "no_winner"),
        }
    }
}

/// Bet acceptance policy: a configured floor plus a finite allow-list of
/// chip denominations.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BetPolicy {
    pub min_bet: Chips,
    pub denominations: Vec<Chips>,
}

impl Default for BetPolicy {
    fn default() -> Self {
        Self {
            min_bet: constants::DEFAULT_MIN_BET,
            denominations: constants::DEFAULT_CHIP_DENOMINATIONS.to_vec(),
        }
    }
}

impl BetPolicy {
    pub fn validate(&self, amount: Chips) -> Result<(), GameError> {
        if amount <= 0 || amount < self.min_bet || !self.denominations.contains(&amount) {
            return Err(GameError::InvalidBetAmount { amount });
        }
        Ok(())
    }
}

/// What happened when a card was dealt.
#[derive(Debug)]
pub struct DealOutcome {
    pub card: Card,
    pub side: Side,
    /// 1-based index of the card within its side's sequence.
    pub position: usize,
    pub is_winning_card: bool,
    pub phase_after: Phase,
    /// Present iff the deal drove the round into a terminal phase.
    pub settlement: Option<Settlement>,
}

/// One play of the game, from opening card to terminal settlement.
#[derive(Debug)]
pub struct Round {
    pub id: RoundId,
    pub opening_card: Card,
    pub phase: Phase,
    pub betting_started_at: DateTime<Utc>,
    pub betting_ends_at: DateTime<Utc>,
    round_two_window: Duration,
    andar_cards: Vec<Card>,
    bahar_cards: Vec<Card>,
    pub winning_side: Option<Side>,
    pub winning_card: Option<Card>,
    used: UsedCards,
    pub ledger: BetLedger,
    pub total_payout: Chips,
}

impl Round {
    /// Create a round from an operator-selected opening card. Enters
    /// `betting(1)` with its window starting at `now`; the opening card
    /// counts as used from creation.
    pub fn open(
        opening_card: Card,
        now: DateTime<Utc>,
        round_one_window: Duration,
        round_two_window: Duration,
    ) -> Result<Self, GameError> {
        let mut used = UsedCards::new();
        used.mark_used(opening_card)?;
        Ok(Self {
            id: Uuid::new_v4(),
            opening_card,
            phase: Phase::Betting { round_number: 1 },
            betting_started_at: now,
            betting_ends_at: now + round_one_window,
            round_two_window,
            andar_cards: Vec::new(),
            bahar_cards: Vec::new(),
            winning_side: None,
            winning_card: None,
            used,
            ledger: BetLedger::new(),
            total_payout: 0,
        })
    }

    /// Evaluate expired betting windows against `now` and advance phases.
    /// Returns every phase entered, in order, so the caller can emit the
    /// matching events. Walks both windows in one call if the clock has
    /// passed both.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Vec<Phase> {
        let mut entered = Vec::new();
        loop {
            match self.phase {
                Phase::Betting { round_number: 1 } if now >= self.betting_ends_at => {
                    // Round 2's window runs from where round 1's ended, so
                    // the schedule doesn't drift with observation lag.
                    self.betting_ends_at += self.round_two_window;
                    self.phase = Phase::Betting { round_number: 2 };
                    entered.push(self.phase);
                }
                Phase::Betting { round_number: 2 } if now >= self.betting_ends_at => {
                    self.phase = Phase::Dealing;
                    entered.push(self.phase);
                }
                _ => break,
            }
        }
        entered
    }

    /// Accept a bet while a betting window is open. The caller advances
    /// phases first, so `now >= betting_ends_at` here means round 2 just
    /// closed on this very access.
    pub fn place_bet(
        &mut self,
        user_id: UserId,
        side: Side,
        amount: Chips,
        now: DateTime<Utc>,
        policy: &BetPolicy,
    ) -> Result<Bet, GameError> {
        match self.phase {
            Phase::Betting { .. } if now < self.betting_ends_at => {}
            _ => return Err(GameError::BettingClosed),
        }
        policy.validate(amount)?;
        Ok(self.ledger.add(user_id, side, amount))
    }

    /// Which side receives the next card: bahar when the total dealt so far
    /// is even, andar when odd. Bahar always deals first.
    pub fn next_side(&self) -> Side {
        if self.cards_dealt() % 2 == 0 {
            Side::Bahar
        } else {
            Side::Andar
        }
    }

    /// Deal an operator-selected card. Only legal in the dealing phase; the
    /// card must not have left the deck already. A rank match against the
    /// opening card completes the round; exhausting the deck without a
    /// match ends it as `no_winner`. Either terminal transition computes
    /// the settlement exactly once.
    pub fn deal_card(&mut self, card: Card) -> Result<DealOutcome, GameError> {
        if self.phase != Phase::Dealing {
            return Err(GameError::PhaseMismatch { phase: self.phase });
        }
        self.used.mark_used(card)?;

        let side = self.next_side();
        let position = match side {
            Side::Andar => {
                self.andar_cards.push(card);
                self.andar_cards.len()
            }
            Side::Bahar => {
                self.bahar_cards.push(card);
                self.bahar_cards.len()
            }
        };

        let is_winning_card = card.rank_matches(&self.opening_card);
        let settlement = if is_winning_card {
            self.phase = Phase::Complete;
            self.winning_side = Some(side);
            self.winning_card = Some(card);
            Some(payout::settle_win(&mut self.ledger, side, position))
        } else if self.used.remaining() == 0 {
            self.phase = Phase::NoWinner;
            Some(payout::settle_refund(&mut self.ledger))
        } else {
            None
        };
        if let Some(settlement) = &settlement {
            self.total_payout = settlement.total_payout;
        }

        Ok(DealOutcome {
            card,
            side,
            position,
            is_winning_card,
            phase_after: self.phase,
            settlement,
        })
    }

    pub fn cards_dealt(&self) -> usize {
        self.andar_cards.len() + self.bahar_cards.len()
    }

    pub fn andar_cards(&self) -> &[Card] {
        &self.andar_cards
    }

    pub fn bahar_cards(&self) -> &[Card] {
        &self.bahar_cards
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// 1 and 2 while betting, 3 from dealing onward.
    pub fn round_number(&self) -> u8 {
        match self.phase {
            Phase::Betting { round_number } => round_number,
            _ => 3,
        }
    }

    /// Consistent read-only copy for stats pages and broadcasts. Readers
    /// never hold a live reference into the round.
    pub fn snapshot(&self) -> RoundSnapshot {
        let (total_andar_bets, total_bahar_bets) = self.ledger.totals();
        RoundSnapshot {
            id: self.id,
            opening_card: self.opening_card,
            phase: self.phase,
            round_number: self.round_number(),
            betting_started_at: self.betting_started_at,
            betting_ends_at: self.betting_ends_at,
            andar_cards: self.andar_cards.clone(),
            bahar_cards: self.bahar_cards.clone(),
            winning_side: self.winning_side,
            winning_card: self.winning_card,
            total_andar_bets,
            total_bahar_bets,
            total_payout: self.total_payout,
        }
    }
}

/// Point-in-time view of a round.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub id: RoundId,
    pub opening_card: Card,
    pub phase: Phase,
    pub round_number: u8,
    pub betting_started_at: DateTime<Utc>,
    pub betting_ends_at: DateTime<Utc>,
    pub andar_cards: Vec<Card>,
    pub bahar_cards: Vec<Card>,
    pub winning_side: Option<Side>,
    pub winning_card: Option<Card>,
    pub total_andar_bets: Chips,
    pub total_bahar_bets: Chips,
    pub total_payout: Chips,
}
