//! Error types for contract and host operations.

use crate::payment::PaymentError;
use crate::protocol::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a contract operation was rejected.
///
/// Every rejection leaves the contract untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("incorrect player")]
    IncorrectPlayer,

    #[error("caller is not the owner")]
    NotOwner,

    #[error("game id already used")]
    GameIdAlreadyUsed,

    #[error("player2 has already made a move")]
    AlreadyMoved,

    #[error("player2 has not made a move")]
    CounterpartyNotMoved,

    #[error("player2 has made a move")]
    CounterpartyMoved,

    #[error("no funds")]
    NoFunds,

    #[error("invalid move")]
    InvalidMove,

    #[error("deposit must be greater than zero")]
    ZeroDeposit,

    #[error("deposit mismatch: expected {expected}, attached {attached}")]
    DepositMismatch { expected: Amount, attached: Amount },

    #[error("game move not expired yet")]
    MoveNotExpired,

    #[error("game reveal not yet expired")]
    RevealNotExpired,

    #[error("paused")]
    Paused,

    #[error("not paused")]
    NotPaused,

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    #[error("amount overflow")]
    AmountOverflow,
}

/// Failure category, so clients can branch on cause
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authorization,
    Phase,
    ValueMismatch,
    Timing,
    Gate,
    Ledger,
    Arithmetic,
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::IncorrectPlayer | ContractError::NotOwner => ErrorKind::Authorization,
            ContractError::GameIdAlreadyUsed
            | ContractError::AlreadyMoved
            | ContractError::CounterpartyNotMoved
            | ContractError::CounterpartyMoved
            | ContractError::NoFunds
            | ContractError::InvalidMove => ErrorKind::Phase,
            ContractError::ZeroDeposit | ContractError::DepositMismatch { .. } => {
                ErrorKind::ValueMismatch
            }
            ContractError::MoveNotExpired | ContractError::RevealNotExpired => ErrorKind::Timing,
            ContractError::Paused | ContractError::NotPaused => ErrorKind::Gate,
            ContractError::NothingToWithdraw => ErrorKind::Ledger,
            ContractError::AmountOverflow => ErrorKind::Arithmetic,
        }
    }
}

/// Errors from [`GameHost`](crate::host::GameHost) operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),
}
