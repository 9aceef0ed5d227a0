//! Owner-controlled circuit breaker for entry points that open new positions.

use crate::error::ContractError;
use crate::protocol::Identity;

#[derive(Clone, Debug)]
pub struct AccessGate {
    owner: Identity,
    paused: bool,
}

impl AccessGate {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails with `Paused` while the gate is engaged
    pub fn ensure_open(&self) -> Result<(), ContractError> {
        if self.paused {
            return Err(ContractError::Paused);
        }
        Ok(())
    }

    pub fn pause(&mut self, caller: Identity) -> Result<(), ContractError> {
        self.ensure_owner(caller)?;
        self.ensure_open()?;
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self, caller: Identity) -> Result<(), ContractError> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(ContractError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    fn ensure_owner(&self, caller: Identity) -> Result<(), ContractError> {
        if caller != self.owner {
            return Err(ContractError::NotOwner);
        }
        Ok(())
    }
}
