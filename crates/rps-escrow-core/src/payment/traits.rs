//! Payment rail trait definition.

use crate::protocol::{Amount, Identity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from value transfers
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Unknown wallet: {0}")]
    UnknownWallet(Identity),

    #[error("Insufficient funds: need {need}, have {available}")]
    InsufficientFunds { need: Amount, available: Amount },

    #[error("Custody holds {held}, cannot pay out {need}")]
    CustodyShortfall { need: Amount, held: Amount },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Transfer identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Create a new random payment ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves value between participant wallets and the contract's custody.
///
/// This is the hosting environment's native transfer. Implementations can be:
/// - MockPaymentRail for testing and the demo service
/// - a real ledger or chain client in production
#[async_trait]
pub trait PaymentRail: Send + Sync {
    /// Pull an attached deposit from `from` into custody
    async fn collect(&self, from: &Identity, amount: Amount) -> Result<PaymentId, PaymentError>;

    /// Push `amount` out of custody to `to`
    async fn pay(&self, to: &Identity, amount: Amount) -> Result<PaymentId, PaymentError>;
}
