//! RPS Escrow Core Library
//!
//! This crate provides the commit-reveal Rock-Paper-Scissors escrow: the
//! commitment scheme, the game state machine with its timeout transitions,
//! the pull-payment balance ledger, and the host that binds them to a
//! payment rail.

pub mod contract;
pub mod crypto;
pub mod error;
pub mod games;
pub mod host;
pub mod payment;
pub mod protocol;

pub use contract::{
    AccessGate, BalanceLedger, Clock, MockClock, RpsContract, SystemClock, WAIT_PERIOD,
};
pub use crypto::{generate_commitment, GameId, Secret};
pub use error::{ContractError, ErrorKind, HostError};
pub use games::{Move, Outcome};
pub use host::GameHost;
pub use payment::{MockPaymentRail, PaymentError, PaymentRail};
pub use protocol::{Amount, ContractEvent, Game, Identity};
