//! # Andar Bahar
//!
//! A live-dealer Andar Bahar round engine: the authoritative state machine
//! that owns round lifecycle, betting-window cutoffs, card dealing and win
//! detection, payout computation, and fan-out of state changes to many
//! concurrent viewers.
//!
//! ## Architecture
//!
//! A round moves through four phases:
//!
//! - **Betting (round 1)**: 60 second window after the operator reveals the
//!   opening card
//! - **Betting (round 2)**: 30 second follow-up window, no cards dealt yet
//! - **Dealing (round 3)**: cards alternate bahar/andar until a rank match
//! - **Complete / NoWinner**: terminal; payouts or refunds are computed once
//!
//! All state mutation on a table (bet acceptance, card deals, phase
//! transitions) is linearized through that table's [`table::RoundMutex`], so
//! concurrent requests can never interleave into an inconsistent round.
//! Outbound aggregate updates are coalesced by a per-table
//! [`broadcast::BroadcastThrottle`]; rare high-value events (cards, winners)
//! bypass it.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, bet ledger, round state machine, payout math
//! - [`table`]: per-table mutex, configuration, table registry
//! - [`broadcast`]: event payloads, room fan-out, coalescing throttler
//! - [`collab`]: balance-ledger and notification collaborator seams

pub mod broadcast;
pub mod clock;
pub mod collab;
pub mod game;
pub mod table;

pub use broadcast::{BroadcastThrottle, RoomRegistry, RoundEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use game::{
    constants,
    entities::{Card, Chips, RoundId, Side, Suit, TableId, UserId},
    errors::GameError,
    round::{Phase, Round, RoundSnapshot},
};
pub use table::{GameTable, RoundMutex, TableConfig, TableManager, TableMetadata};
