//! Pull-payment balance ledger.

use crate::error::ContractError;
use crate::protocol::{Amount, Identity};
use std::collections::HashMap;

/// Withdrawable amounts per identity.
///
/// Credited by game resolution; debited only by the owner's own withdrawal.
#[derive(Clone, Debug, Default)]
pub struct BalanceLedger {
    balances: HashMap<Identity, Amount>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, who: &Identity) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Sum of every balance
    pub fn total(&self) -> Amount {
        self.balances
            .values()
            .fold(0, |acc, amount| acc.saturating_add(*amount))
    }

    /// Apply several credits, or none of them if any would overflow.
    pub fn credit_all(&mut self, credits: &[(Identity, Amount)]) -> Result<(), ContractError> {
        let mut planned: HashMap<Identity, Amount> = HashMap::new();
        for (who, amount) in credits {
            let current = match planned.get(who) {
                Some(pending) => *pending,
                None => self.balance_of(who),
            };
            let next = current
                .checked_add(*amount)
                .ok_or(ContractError::AmountOverflow)?;
            planned.insert(*who, next);
        }
        for (who, next) in planned {
            self.balances.insert(who, next);
        }
        Ok(())
    }

    pub fn credit(&mut self, who: Identity, amount: Amount) -> Result<(), ContractError> {
        self.credit_all(&[(who, amount)])
    }

    /// Zero `who`'s balance and return what it held.
    pub fn take(&mut self, who: &Identity) -> Result<Amount, ContractError> {
        match self.balances.remove(who) {
            Some(amount) if amount > 0 => Ok(amount),
            _ => Err(ContractError::NothingToWithdraw),
        }
    }
}
