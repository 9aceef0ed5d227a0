//! The game/escrow state machine.
//!
//! Each operation validates every guard before touching state, so a
//! rejected call leaves games, balances and the event log exactly as they
//! were. Callers that share a contract serialize access to it (see
//! [`GameHost`](crate::host::GameHost)).

mod clock;
mod gate;
mod ledger;

pub use clock::{Clock, MockClock, SystemClock};
pub use gate::AccessGate;
pub use ledger::BalanceLedger;

use crate::crypto::{GameId, Secret};
use crate::error::ContractError;
use crate::games::{Move, Outcome};
use crate::protocol::{Amount, ContractEvent, Game, Identity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long a counterparty may stay silent, after commit and again after
/// Player 2's move.
pub const WAIT_PERIOD: Duration = Duration::from_secs(10 * 60);

pub struct RpsContract {
    games: HashMap<GameId, Game>,
    ledger: BalanceLedger,
    gate: AccessGate,
    clock: Arc<dyn Clock>,
    events: Vec<ContractEvent>,
    total_deposited: Amount,
    total_withdrawn: Amount,
}

impl RpsContract {
    pub fn new(owner: Identity, clock: Arc<dyn Clock>) -> Self {
        Self {
            games: HashMap::new(),
            ledger: BalanceLedger::new(),
            gate: AccessGate::new(owner),
            clock,
            events: Vec::new(),
            total_deposited: 0,
            total_withdrawn: 0,
        }
    }

    // Queries

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn wait_period(&self) -> Duration {
        WAIT_PERIOD
    }

    /// Live game for `game_id`; `None` once resolved or if never created
    pub fn game(&self, game_id: &GameId) -> Option<&Game> {
        self.games.get(game_id)
    }

    pub fn balance_of(&self, who: &Identity) -> Amount {
        self.ledger.balance_of(who)
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn owner(&self) -> Identity {
        self.gate.owner()
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_withdrawn(&self) -> Amount {
        self.total_withdrawn
    }

    /// Value locked in live games
    pub fn escrowed(&self) -> Amount {
        self.games
            .values()
            .fold(0, |acc, game| acc.saturating_add(game.escrowed()))
    }

    /// Value owed to participants but not yet withdrawn
    pub fn ledger_total(&self) -> Amount {
        self.ledger.total()
    }

    /// Balances plus escrow equal everything deposited minus everything paid out
    pub fn is_conserved(&self) -> bool {
        self.ledger_total().checked_add(self.escrowed())
            == self.total_deposited.checked_sub(self.total_withdrawn)
    }

    // Operations

    /// Open a game. `deposit` is the value attached by `caller`.
    pub fn commit_move(
        &mut self,
        caller: Identity,
        game_id: GameId,
        player2: Identity,
        deposit: Amount,
    ) -> Result<(), ContractError> {
        self.gate.ensure_open()?;
        if deposit == 0 {
            return Err(ContractError::ZeroDeposit);
        }
        if self.games.contains_key(&game_id) {
            return Err(ContractError::GameIdAlreadyUsed);
        }
        let total_deposited = self
            .total_deposited
            .checked_add(deposit)
            .ok_or(ContractError::AmountOverflow)?;
        let expiration = self.deadline()?;

        self.games.insert(
            game_id,
            Game {
                player1: caller,
                player2,
                move2: Move::None,
                deposit,
                expiration,
            },
        );
        self.total_deposited = total_deposited;
        info!(game_id = %game_id, player1 = %caller, player2 = %player2, deposit, "Game opened");
        self.emit(ContractEvent::MoveCommitted {
            game_id,
            player1: caller,
            player2,
            deposit,
        });
        Ok(())
    }

    /// Player 2's move, in the clear, with a matching deposit.
    pub fn play_move(
        &mut self,
        caller: Identity,
        game_id: GameId,
        game_move: Move,
        deposit: Amount,
    ) -> Result<(), ContractError> {
        self.gate.ensure_open()?;
        if !game_move.is_playable() {
            return Err(ContractError::InvalidMove);
        }
        let game = self
            .games
            .get(&game_id)
            .filter(|game| game.player2 == caller)
            .ok_or(ContractError::IncorrectPlayer)?;
        if game.has_second_move() {
            return Err(ContractError::AlreadyMoved);
        }
        if deposit != game.deposit {
            return Err(ContractError::DepositMismatch {
                expected: game.deposit,
                attached: deposit,
            });
        }
        // Payout on a win is 2 × deposit
        deposit
            .checked_mul(2)
            .ok_or(ContractError::AmountOverflow)?;
        let total_deposited = self
            .total_deposited
            .checked_add(deposit)
            .ok_or(ContractError::AmountOverflow)?;
        let expiration = self.deadline()?;

        if let Some(game) = self.games.get_mut(&game_id) {
            game.move2 = game_move;
            game.expiration = expiration;
        }
        self.total_deposited = total_deposited;
        info!(game_id = %game_id, player2 = %caller, game_move = %game_move, "Second move played");
        self.emit(ContractEvent::MovePlayed {
            game_id,
            player: caller,
            game_move,
            deposit,
        });
        Ok(())
    }

    /// Player 1 discloses move and secret; the game resolves and is removed.
    ///
    /// The game is found by re-deriving its id from the caller, so a wrong
    /// move, wrong secret or wrong caller all look like a game nobody has
    /// played against yet.
    pub fn reveal(
        &mut self,
        caller: Identity,
        game_move: Move,
        secret: &Secret,
    ) -> Result<Outcome, ContractError> {
        if !game_move.is_playable() {
            return Err(ContractError::InvalidMove);
        }
        let game_id = GameId::derive(&caller, game_move, secret);
        let game = self
            .games
            .get(&game_id)
            .filter(|game| game.has_second_move())
            .ok_or(ContractError::CounterpartyNotMoved)?;
        let outcome =
            Outcome::judge(game_move, game.move2).ok_or(ContractError::CounterpartyNotMoved)?;
        let (player1, player2, deposit) = (caller, game.player2, game.deposit);
        let pot = deposit
            .checked_mul(2)
            .ok_or(ContractError::AmountOverflow)?;

        let resolution = match outcome {
            Outcome::Draw => {
                self.ledger
                    .credit_all(&[(player1, deposit), (player2, deposit)])?;
                ContractEvent::DrawDeclared {
                    game_id,
                    player1,
                    player2,
                    refund: deposit,
                }
            }
            Outcome::Player1Wins | Outcome::Player2Wins => {
                let winner = if outcome == Outcome::Player1Wins {
                    player1
                } else {
                    player2
                };
                self.ledger.credit(winner, pot)?;
                ContractEvent::WinnerDeclared {
                    game_id,
                    winner,
                    winnings: pot,
                }
            }
        };

        self.games.remove(&game_id);
        info!(game_id = %game_id, player1 = %caller, ?outcome, "Game resolved by reveal");
        self.emit(ContractEvent::MoveRevealed {
            game_id,
            player: caller,
            game_move,
        });
        self.emit(resolution);
        Ok(outcome)
    }

    /// Player 1 takes the deposit back when Player 2 never moved in time.
    pub fn reclaim_funds(
        &mut self,
        caller: Identity,
        game_id: GameId,
    ) -> Result<Amount, ContractError> {
        let now = self.now();
        let game = self.games.get(&game_id).ok_or(ContractError::NoFunds)?;
        if game.has_second_move() {
            return Err(ContractError::CounterpartyMoved);
        }
        if game.player1 != caller {
            return Err(ContractError::IncorrectPlayer);
        }
        if !game.is_expired(now) {
            return Err(ContractError::MoveNotExpired);
        }
        let amount = game.deposit;

        self.ledger.credit(caller, amount)?;
        self.games.remove(&game_id);
        info!(game_id = %game_id, player1 = %caller, amount, "Deposit reclaimed after timeout");
        self.emit(ContractEvent::FundsReclaimed {
            game_id,
            player: caller,
            amount,
        });
        Ok(amount)
    }

    /// Player 2 takes both deposits when Player 1 never revealed in time.
    pub fn claim_funds(
        &mut self,
        caller: Identity,
        game_id: GameId,
    ) -> Result<Amount, ContractError> {
        let now = self.now();
        let game = self
            .games
            .get(&game_id)
            .filter(|game| game.has_second_move())
            .ok_or(ContractError::CounterpartyNotMoved)?;
        if game.player2 != caller {
            return Err(ContractError::IncorrectPlayer);
        }
        if !game.is_expired(now) {
            return Err(ContractError::RevealNotExpired);
        }
        let amount = game
            .deposit
            .checked_mul(2)
            .ok_or(ContractError::AmountOverflow)?;

        self.ledger.credit(caller, amount)?;
        self.games.remove(&game_id);
        info!(game_id = %game_id, player2 = %caller, amount, "Pot claimed after reveal timeout");
        self.emit(ContractEvent::FundsClaimed {
            game_id,
            player: caller,
            amount,
        });
        Ok(amount)
    }

    /// First half of a withdrawal: zero the caller's balance and return it.
    ///
    /// The amount counts as withdrawn from here on, so the books stay
    /// balanced while the transfer is in flight. Follow with
    /// [`settle_withdrawal`](Self::settle_withdrawal) once the transfer went
    /// through, or [`abort_withdrawal`](Self::abort_withdrawal) if it failed.
    pub fn begin_withdrawal(&mut self, caller: Identity) -> Result<Amount, ContractError> {
        let amount = self.ledger.balance_of(&caller);
        let total_withdrawn = self
            .total_withdrawn
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)?;
        self.ledger.take(&caller)?;
        self.total_withdrawn = total_withdrawn;
        debug!(player = %caller, amount, "Balance zeroed for withdrawal");
        Ok(amount)
    }

    pub fn settle_withdrawal(&mut self, caller: Identity, amount: Amount) {
        info!(player = %caller, amount, "Withdrawal settled");
        self.emit(ContractEvent::WithdrawalSettled {
            player: caller,
            amount,
        });
    }

    /// Restore a balance whose transfer failed
    pub fn abort_withdrawal(
        &mut self,
        caller: Identity,
        amount: Amount,
    ) -> Result<(), ContractError> {
        let total_withdrawn = self
            .total_withdrawn
            .checked_sub(amount)
            .ok_or(ContractError::AmountOverflow)?;
        self.ledger.credit(caller, amount)?;
        self.total_withdrawn = total_withdrawn;
        Ok(())
    }

    /// Book a deposit that was collected for a rejected call but could not
    /// be sent back. It becomes part of the caller's withdrawable balance.
    pub fn credit_unreturned_deposit(
        &mut self,
        caller: Identity,
        amount: Amount,
    ) -> Result<(), ContractError> {
        let total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(ContractError::AmountOverflow)?;
        self.ledger.credit(caller, amount)?;
        self.total_deposited = total_deposited;
        info!(player = %caller, amount, "Unreturned deposit credited");
        self.emit(ContractEvent::DepositCredited {
            player: caller,
            amount,
        });
        Ok(())
    }

    pub fn pause(&mut self, caller: Identity) -> Result<(), ContractError> {
        self.gate.pause(caller)?;
        info!(by = %caller, "Contract paused");
        self.emit(ContractEvent::Paused { by: caller });
        Ok(())
    }

    pub fn resume(&mut self, caller: Identity) -> Result<(), ContractError> {
        self.gate.resume(caller)?;
        info!(by = %caller, "Contract resumed");
        self.emit(ContractEvent::Resumed { by: caller });
        Ok(())
    }

    fn deadline(&self) -> Result<DateTime<Utc>, ContractError> {
        let wait = chrono::Duration::from_std(WAIT_PERIOD)
            .map_err(|_| ContractError::AmountOverflow)?;
        self.now()
            .checked_add_signed(wait)
            .ok_or(ContractError::AmountOverflow)
    }

    fn emit(&mut self, event: ContractEvent) {
        debug!(event = event.name(), "Event emitted");
        self.events.push(event);
    }
}
