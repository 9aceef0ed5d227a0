//! Protocol types and events.

pub mod amount;
mod events;
mod types;

pub use events::ContractEvent;
pub use amount::Amount;
pub use types::{Game, Identity};
