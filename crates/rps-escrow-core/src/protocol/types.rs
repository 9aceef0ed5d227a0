//! Protocol types.

use crate::games::Move;
use crate::protocol::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Participant identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    /// Create a new random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get bytes representation for hashing
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Identity {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live game, keyed by its [`GameId`](crate::crypto::GameId).
///
/// Resolved games are removed rather than kept around zeroed, so a lookup
/// that returns `None` is the "zeroed" state: no player2, no move, no
/// deposit, no expiration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Identity that committed the game
    pub player1: Identity,
    /// The only identity allowed to play the second move
    pub player2: Identity,
    /// Player 2's move, `Move::None` until played
    pub move2: Move,
    /// Wager each side puts in
    #[serde(with = "crate::protocol::amount")]
    pub deposit: Amount,
    /// Deadline for the counterparty who has to act next
    pub expiration: DateTime<Utc>,
}

impl Game {
    /// Has Player 2 played?
    pub fn has_second_move(&self) -> bool {
        self.move2.is_playable()
    }

    /// Amount currently held in escrow for this game
    pub fn escrowed(&self) -> Amount {
        if self.has_second_move() {
            self.deposit.saturating_mul(2)
        } else {
            self.deposit
        }
    }

    /// Has the deadline passed at `now`?
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }
}
