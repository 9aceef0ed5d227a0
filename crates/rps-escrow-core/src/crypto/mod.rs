//! Cryptographic primitives for the escrow protocol.
//!
//! This module provides:
//! - Secret, the blinding value Player 1 keeps until reveal
//! - GameId, the commitment that doubles as the game's primary key

mod commitment;

pub use commitment::{generate_commitment, GameId, Secret};
