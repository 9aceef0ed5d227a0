//! Events emitted by successful contract operations.

use crate::crypto::GameId;
use crate::games::Move;
use crate::protocol::{Amount, Identity};
use serde::Serialize;

/// Append-only contract event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContractEvent {
    MoveCommitted {
        game_id: GameId,
        player1: Identity,
        player2: Identity,
        #[serde(with = "crate::protocol::amount")]
        deposit: Amount,
    },
    MovePlayed {
        game_id: GameId,
        player: Identity,
        game_move: Move,
        #[serde(with = "crate::protocol::amount")]
        deposit: Amount,
    },
    MoveRevealed {
        game_id: GameId,
        player: Identity,
        game_move: Move,
    },
    WinnerDeclared {
        game_id: GameId,
        winner: Identity,
        #[serde(with = "crate::protocol::amount")]
        winnings: Amount,
    },
    /// `refund` is what each side gets back
    DrawDeclared {
        game_id: GameId,
        player1: Identity,
        player2: Identity,
        #[serde(with = "crate::protocol::amount")]
        refund: Amount,
    },
    FundsReclaimed {
        game_id: GameId,
        player: Identity,
        #[serde(with = "crate::protocol::amount")]
        amount: Amount,
    },
    FundsClaimed {
        game_id: GameId,
        player: Identity,
        #[serde(with = "crate::protocol::amount")]
        amount: Amount,
    },
    WithdrawalSettled {
        player: Identity,
        #[serde(with = "crate::protocol::amount")]
        amount: Amount,
    },
    /// A rejected call's deposit that could not be returned, now withdrawable
    DepositCredited {
        player: Identity,
        #[serde(with = "crate::protocol::amount")]
        amount: Amount,
    },
    Paused {
        by: Identity,
    },
    Resumed {
        by: Identity,
    },
}

impl ContractEvent {
    /// Game this event belongs to, if any
    pub fn game_id(&self) -> Option<&GameId> {
        match self {
            ContractEvent::MoveCommitted { game_id, .. }
            | ContractEvent::MovePlayed { game_id, .. }
            | ContractEvent::MoveRevealed { game_id, .. }
            | ContractEvent::WinnerDeclared { game_id, .. }
            | ContractEvent::DrawDeclared { game_id, .. }
            | ContractEvent::FundsReclaimed { game_id, .. }
            | ContractEvent::FundsClaimed { game_id, .. } => Some(game_id),
            ContractEvent::WithdrawalSettled { .. }
            | ContractEvent::DepositCredited { .. }
            | ContractEvent::Paused { .. }
            | ContractEvent::Resumed { .. } => None,
        }
    }

    /// Short name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::MoveCommitted { .. } => "move_committed",
            ContractEvent::MovePlayed { .. } => "move_played",
            ContractEvent::MoveRevealed { .. } => "move_revealed",
            ContractEvent::WinnerDeclared { .. } => "winner_declared",
            ContractEvent::DrawDeclared { .. } => "draw_declared",
            ContractEvent::FundsReclaimed { .. } => "funds_reclaimed",
            ContractEvent::FundsClaimed { .. } => "funds_claimed",
            ContractEvent::WithdrawalSettled { .. } => "withdrawal_settled",
            ContractEvent::DepositCredited { .. } => "deposit_credited",
            ContractEvent::Paused { .. } => "paused",
            ContractEvent::Resumed { .. } => "resumed",
        }
    }
}
