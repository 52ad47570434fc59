//! Core game logic: cards, bets, the round state machine, and payout math.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod ledger;
pub mod payout;
pub mod round;

pub use entities::{Card, Chips, Side, Suit, UsedCards};
pub use errors::GameError;
pub use ledger::{Bet, BetLedger, BetStatus};
pub use payout::{Settlement, UserPayout};
pub use round::{DealOutcome, Phase, Round, RoundSnapshot};
