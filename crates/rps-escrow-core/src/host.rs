//! Transactional host: one serialized contract plus the value-transfer rail.

use crate::contract::{Clock, RpsContract};
use crate::crypto::{GameId, Secret};
use crate::error::{ContractError, HostError};
use crate::games::{Move, Outcome};
use crate::payment::PaymentRail;
use crate::protocol::{Amount, ContractEvent, Game, Identity};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Shared handle to a hosted contract.
///
/// Every operation takes the contract lock once and runs all of its guards
/// and effects under it. The lock is never held across a transfer.
#[derive(Clone)]
pub struct GameHost {
    contract: Arc<Mutex<RpsContract>>,
    rail: Arc<dyn PaymentRail>,
}

impl GameHost {
    pub fn new(owner: Identity, clock: Arc<dyn Clock>, rail: Arc<dyn PaymentRail>) -> Self {
        Self {
            contract: Arc::new(Mutex::new(RpsContract::new(owner, clock))),
            rail,
        }
    }

    /// Run a read-only closure against the contract
    pub fn inspect<T>(&self, f: impl FnOnce(&RpsContract) -> T) -> T {
        f(&self.contract.lock())
    }

    pub fn game(&self, game_id: &GameId) -> Option<Game> {
        self.contract.lock().game(game_id).cloned()
    }

    pub fn balance_of(&self, who: &Identity) -> Amount {
        self.contract.lock().balance_of(who)
    }

    pub fn wait_period(&self) -> Duration {
        self.contract.lock().wait_period()
    }

    pub fn is_paused(&self) -> bool {
        self.contract.lock().is_paused()
    }

    pub fn owner(&self) -> Identity {
        self.contract.lock().owner()
    }

    pub fn events(&self) -> Vec<ContractEvent> {
        self.contract.lock().events().to_vec()
    }

    pub async fn commit_move(
        &self,
        caller: Identity,
        game_id: GameId,
        player2: Identity,
        deposit: Amount,
    ) -> Result<(), HostError> {
        self.with_deposit(caller, deposit, |contract| {
            contract.commit_move(caller, game_id, player2, deposit)
        })
        .await
        .inspect_err(|e| warn!(game_id = %game_id, player = %caller, "commit rejected: {}", e))
    }

    pub async fn play_move(
        &self,
        caller: Identity,
        game_id: GameId,
        game_move: Move,
        deposit: Amount,
    ) -> Result<(), HostError> {
        self.with_deposit(caller, deposit, |contract| {
            contract.play_move(caller, game_id, game_move, deposit)
        })
        .await
        .inspect_err(|e| warn!(game_id = %game_id, player = %caller, "move rejected: {}", e))
    }

    pub fn reveal(
        &self,
        caller: Identity,
        game_move: Move,
        secret: &Secret,
    ) -> Result<Outcome, HostError> {
        self.contract
            .lock()
            .reveal(caller, game_move, secret)
            .inspect_err(|e| warn!(player = %caller, "reveal rejected: {}", e))
            .map_err(Into::into)
    }

    pub fn reclaim_funds(&self, caller: Identity, game_id: GameId) -> Result<Amount, HostError> {
        self.contract
            .lock()
            .reclaim_funds(caller, game_id)
            .inspect_err(|e| warn!(game_id = %game_id, player = %caller, "reclaim rejected: {}", e))
            .map_err(Into::into)
    }

    pub fn claim_funds(&self, caller: Identity, game_id: GameId) -> Result<Amount, HostError> {
        self.contract
            .lock()
            .claim_funds(caller, game_id)
            .inspect_err(|e| warn!(game_id = %game_id, player = %caller, "claim rejected: {}", e))
            .map_err(Into::into)
    }

    /// Pay out the caller's whole balance.
    ///
    /// The balance is zeroed before the transfer starts, so a re-entrant
    /// withdrawal during the transfer finds nothing. A failed transfer
    /// restores the balance and emits nothing.
    pub async fn withdraw(&self, caller: Identity) -> Result<Amount, HostError> {
        let amount = self
            .contract
            .lock()
            .begin_withdrawal(caller)
            .inspect_err(|e| warn!(player = %caller, "withdrawal rejected: {}", e))?;

        match self.rail.pay(&caller, amount).await {
            Ok(_) => {
                self.contract.lock().settle_withdrawal(caller, amount);
                Ok(amount)
            }
            Err(payment_err) => {
                warn!(player = %caller, amount, "withdrawal transfer failed: {}", payment_err);
                if let Err(e) = self.contract.lock().abort_withdrawal(caller, amount) {
                    error!(player = %caller, amount, "could not restore balance: {}", e);
                    return Err(e.into());
                }
                Err(payment_err.into())
            }
        }
    }

    pub fn pause(&self, caller: Identity) -> Result<(), HostError> {
        Ok(self.contract.lock().pause(caller)?)
    }

    pub fn resume(&self, caller: Identity) -> Result<(), HostError> {
        Ok(self.contract.lock().resume(caller)?)
    }

    /// Collect `deposit` from `caller`, then apply `op`; refund if `op` rejects.
    ///
    /// A refund that cannot be delivered is credited to the caller's
    /// balance instead, so the value stays withdrawable. Either way the
    /// caller sees the contract's rejection.
    async fn with_deposit(
        &self,
        caller: Identity,
        deposit: Amount,
        op: impl FnOnce(&mut RpsContract) -> Result<(), ContractError>,
    ) -> Result<(), HostError> {
        if deposit == 0 {
            // Nothing to collect; let the contract report the right reason
            return Ok(op(&mut self.contract.lock())?);
        }
        self.rail.collect(&caller, deposit).await?;

        let applied = op(&mut self.contract.lock());
        let Err(rejection) = applied else {
            return Ok(());
        };
        if let Err(refund_err) = self.rail.pay(&caller, deposit).await {
            warn!(player = %caller, deposit, "refund of rejected deposit failed: {}", refund_err);
            if let Err(e) = self
                .contract
                .lock()
                .credit_unreturned_deposit(caller, deposit)
            {
                error!(player = %caller, deposit, "could not credit unreturned deposit: {}", e);
                return Err(e.into());
            }
        }
        Err(rejection.into())
    }
}
