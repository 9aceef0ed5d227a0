//! Game id commitments: GameId = H(player1 || move || secret).

use crate::games::Move;
use crate::protocol::Identity;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Secret chosen by Player 1 to blind the committed move
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; 32]);

impl Secret {
    /// Create a new random secret
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Left-align a short byte string into a zero-padded secret.
    ///
    /// Returns `None` when the input is longer than 32 bytes.
    pub fn from_padded(input: &[u8]) -> Option<Self> {
        if input.len() > 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[..input.len()].copy_from_slice(input);
        Some(Self(bytes))
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for Secret {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        hex::encode(self.0).serialize(s)
    }
}

/// Accepts either 64 hex digits or a short passphrase of at most 32 bytes,
/// which is zero-padded the same way as [`Secret::from_padded`].
impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let text = String::deserialize(d)?;
        text.parse::<Secret>()
            .ok()
            .or_else(|| Secret::from_padded(text.as_bytes()))
            .ok_or_else(|| {
                serde::de::Error::custom("secret must be 64 hex digits or at most 32 bytes")
            })
    }
}

/// Commitment to (player1, move, secret), used as the game's key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId([u8; 32]);

impl GameId {
    /// Derive the commitment for a move.
    pub fn derive(player1: &Identity, game_move: Move, secret: &Secret) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(player1.as_bytes());
        hasher.update([game_move as u8]);
        hasher.update(secret.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether the preimage reproduces this id
    pub fn verify(&self, player1: &Identity, game_move: Move, secret: &Secret) -> bool {
        *self == Self::derive(player1, game_move, secret)
    }
}

/// Compute the game id a prospective Player 1 commits with.
///
/// Pure and deterministic, so it can run off-system before `commit_move`.
pub fn generate_commitment(player1: &Identity, game_move: Move, secret: &Secret) -> GameId {
    GameId::derive(player1, game_move, secret)
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for GameId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for GameId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(s)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(d)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}
