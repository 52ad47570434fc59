//! Game-wide constants.

use super::entities::Chips;

/// Cards in a standard deck. One round never replays a card.
pub const DECK_SIZE: usize = 52;

/// Betting window for round 1, opened at round creation.
pub const ROUND_ONE_BETTING_SECS: u64 = 60;

/// Betting window for round 2, opened when round 1 expires.
pub const ROUND_TWO_BETTING_SECS: u64 = 30;

/// Commission retained from gross winnings, in percent.
pub const COMMISSION_PCT: Chips = 5;

/// Winning-side position that pays the bonus tier.
pub const BONUS_POSITION: usize = 5;

/// Gross payout multiplier at [`BONUS_POSITION`], before commission.
pub const BONUS_MULTIPLIER: Chips = 4;

/// Default floor for a single bet.
pub const DEFAULT_MIN_BET: Chips = 1_000;

/// Default chip denominations accepted for a bet. Amounts outside this
/// allow-list are rejected outright.
pub const DEFAULT_CHIP_DENOMINATIONS: [Chips; 7] =
    [1_000, 2_500, 5_000, 10_000, 25_000, 50_000, 100_000];

/// Default rolling window for the broadcast throttler, in milliseconds.
pub const DEFAULT_THROTTLE_WINDOW_MS: u64 = 1_000;

/// Default cap on waiting for a table's round mutex, in milliseconds.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
