//! Move set and adjudication.

mod rps;

pub use rps::{InvalidMove, Move, Outcome};
