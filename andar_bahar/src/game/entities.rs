use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};

use super::{constants, errors::GameError};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values (ace=1u8 ... king=13u8).
pub type Value = u8;

/// A card is a tuple of a value and a suit. Only the value matters for win
/// detection; the full identity matters for the used-card set.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    /// Whether this card's rank matches another's, the win condition.
    pub fn rank_matches(&self, other: &Card) -> bool {
        self.0 == other.0
    }

    /// A card identity is only meaningful for values 1 (ace) through 13 (king).
    pub fn is_valid(&self) -> bool {
        (1..=13).contains(&self.0)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            1 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        write!(f, "{value}{}", self.1)
    }
}

/// The two sides players bet on and cards are dealt to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Andar,
    Bahar,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Andar => "andar",
            Self::Bahar => "bahar",
        };
        write!(f, "{repr}")
    }
}

/// Type alias for chips. All bets and payouts are whole chips.
pub type Chips = i64;

pub type UserId = i64;
pub type TableId = u64;
pub type RoundId = uuid::Uuid;

/// Per-round set of card identities that have left the deck. The opening
/// card is a member from round creation.
#[derive(Debug, Default)]
pub struct UsedCards {
    used: HashSet<Card>,
}

impl UsedCards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a card as dealt. Rejects a replay of an identity already out of
    /// the deck; the round state is unchanged on rejection.
    pub fn mark_used(&mut self, card: Card) -> Result<(), GameError> {
        if !card.is_valid() {
            return Err(GameError::InvalidCard { card });
        }
        if !self.used.insert(card) {
            return Err(GameError::CardAlreadyUsed { card });
        }
        Ok(())
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.used.contains(card)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// How many of the 52 deck cards are still undealt.
    pub fn remaining(&self) -> usize {
        constants::DECK_SIZE - self.used.len()
    }
}

/// All 52 card identities, for tests and exhaustion checks.
pub fn full_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(constants::DECK_SIZE);
    for value in 1u8..=13 {
        for suit in [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club] {
            cards.push(Card(value, suit));
        }
    }
    cards
}
