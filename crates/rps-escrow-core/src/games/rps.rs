//! Rock-Paper-Scissors moves and the cyclic beats-relation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A move, encoded as 0-3. `None` marks "not yet played".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Move {
    #[default]
    None = 0,
    Rock = 1,
    Paper = 2,
    Scissors = 3,
}

impl Move {
    /// Whether this is one of the three playable moves
    pub fn is_playable(&self) -> bool {
        !matches!(self, Move::None)
    }

    /// Check if this move beats the other
    pub fn beats(&self, other: &Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) | (Move::Paper, Move::Rock)
        )
    }
}

/// Invalid move encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid move encoding: {0}")]
pub struct InvalidMove(pub u8);

impl TryFrom<u8> for Move {
    type Error = InvalidMove;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Move::None),
            1 => Ok(Move::Rock),
            2 => Ok(Move::Paper),
            3 => Ok(Move::Scissors),
            other => Err(InvalidMove(other)),
        }
    }
}

impl From<Move> for u8 {
    fn from(value: Move) -> Self {
        value as u8
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::None => "none",
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// Result of comparing Player 1's revealed move against Player 2's move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Draw,
    Player1Wins,
    Player2Wins,
}

impl Outcome {
    /// Adjudicate two playable moves.
    ///
    /// `(3 + move1 - move2) % 3` is 0 for a draw, 1 when `move1` wins and
    /// 2 when `move2` wins. Returns `None` if either move is `Move::None`.
    pub fn judge(move1: Move, move2: Move) -> Option<Outcome> {
        if !move1.is_playable() || !move2.is_playable() {
            return None;
        }
        match (3 + move1 as u8 - move2 as u8) % 3 {
            0 => Some(Outcome::Draw),
            1 => Some(Outcome::Player1Wins),
            _ => Some(Outcome::Player2Wins),
        }
    }
}
