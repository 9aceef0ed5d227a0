//! Integration tests for complete game sessions through the host.
//!
//! These tests drive the contract and the mock payment rail together, the
//! way the HTTP service does.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rps_escrow_core::{
    generate_commitment, Amount, ContractError, ContractEvent, GameHost, GameId, HostError,
    Identity, MockClock, MockPaymentRail, Move, Outcome, PaymentError, PaymentRail, Secret,
};
use rps_escrow_core::payment::PaymentId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// 4 finney in wei
const DEPOSIT: Amount = 4_000_000_000_000_000;
const WALLET: Amount = 1_000_000_000_000_000_000;

struct Table {
    host: GameHost,
    rail: MockPaymentRail,
    clock: MockClock,
    owner: Identity,
    alice: Identity,
    bob: Identity,
    secret: Secret,
}

impl Table {
    fn new() -> Self {
        let rail = MockPaymentRail::new();
        let clock = MockClock::default();
        let owner = Identity::new();
        let alice = Identity::new();
        let bob = Identity::new();
        rail.fund(alice, WALLET);
        rail.fund(bob, WALLET);
        Self {
            host: GameHost::new(owner, Arc::new(clock.clone()), Arc::new(rail.clone())),
            rail,
            clock,
            owner,
            alice,
            bob,
            secret: Secret::from_padded(b"AliceSecret&").unwrap(),
        }
    }

    async fn commit(&self, game_move: Move) -> GameId {
        let id = generate_commitment(&self.alice, game_move, &self.secret);
        self.host
            .commit_move(self.alice, id, self.bob, DEPOSIT)
            .await
            .unwrap();
        id
    }

    async fn commit_and_play(&self, move1: Move, move2: Move) -> GameId {
        let id = self.commit(move1).await;
        self.host
            .play_move(self.bob, id, move2, DEPOSIT)
            .await
            .unwrap();
        id
    }

    fn assert_books_balance(&self) {
        self.host.inspect(|contract| {
            assert!(contract.is_conserved());
            assert_eq!(
                self.rail.custody(),
                contract.ledger_total() + contract.escrowed()
            );
        });
    }
}

fn contract_err(err: HostError) -> ContractError {
    match err {
        HostError::Contract(e) => e,
        other => panic!("expected contract error, got {other}"),
    }
}

#[tokio::test]
async fn test_draw_refunds_both_players() {
    let t = Table::new();
    let id = t.commit_and_play(Move::Rock, Move::Rock).await;
    assert_eq!(t.rail.custody(), 2 * DEPOSIT);

    let outcome = t.host.reveal(t.alice, Move::Rock, &t.secret).unwrap();
    assert_eq!(outcome, Outcome::Draw);

    let events = t.host.events();
    assert_eq!(
        &events[events.len() - 2..],
        &[
            ContractEvent::MoveRevealed {
                game_id: id,
                player: t.alice,
                game_move: Move::Rock,
            },
            ContractEvent::DrawDeclared {
                game_id: id,
                player1: t.alice,
                player2: t.bob,
                refund: DEPOSIT,
            },
        ]
    );

    assert_eq!(t.host.withdraw(t.bob).await.unwrap(), DEPOSIT);
    assert_eq!(t.host.withdraw(t.alice).await.unwrap(), DEPOSIT);
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET));
    assert_eq!(t.rail.wallet(&t.bob), Some(WALLET));
    assert!(t.host.game(&id).is_none());

    assert_eq!(
        contract_err(t.host.reclaim_funds(t.alice, id).unwrap_err()),
        ContractError::NoFunds
    );
    assert_eq!(
        contract_err(t.host.claim_funds(t.bob, id).unwrap_err()),
        ContractError::CounterpartyNotMoved
    );
    t.assert_books_balance();
}

#[tokio::test]
async fn test_reclaim_when_player2_never_moves() {
    let t = Table::new();
    let id = t.commit(Move::Rock).await;

    t.clock.advance(9 * 60);
    assert_eq!(
        contract_err(t.host.reclaim_funds(t.alice, id).unwrap_err()),
        ContractError::MoveNotExpired
    );

    t.clock.advance(2 * 60);
    assert_eq!(t.host.reclaim_funds(t.alice, id).unwrap(), DEPOSIT);
    assert!(t.host.game(&id).is_none());
    assert_eq!(
        t.host.events().last(),
        Some(&ContractEvent::FundsReclaimed {
            game_id: id,
            player: t.alice,
            amount: DEPOSIT,
        })
    );

    // Bob is too late, and his deposit stays in his wallet
    assert_eq!(
        contract_err(
            t.host
                .play_move(t.bob, id, Move::Paper, DEPOSIT)
                .await
                .unwrap_err()
        ),
        ContractError::IncorrectPlayer
    );
    assert_eq!(t.rail.wallet(&t.bob), Some(WALLET));

    assert_eq!(t.host.withdraw(t.alice).await.unwrap(), DEPOSIT);
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET));
    t.assert_books_balance();
}

#[tokio::test]
async fn test_claim_when_player1_never_reveals() {
    let t = Table::new();
    let id = t.commit_and_play(Move::Rock, Move::Paper).await;

    t.clock.advance(5 * 60);
    assert_eq!(
        contract_err(t.host.claim_funds(t.bob, id).unwrap_err()),
        ContractError::RevealNotExpired
    );
    assert_eq!(
        contract_err(t.host.reclaim_funds(t.alice, id).unwrap_err()),
        ContractError::CounterpartyMoved
    );

    t.clock.advance(6 * 60);
    assert_eq!(t.host.claim_funds(t.bob, id).unwrap(), 2 * DEPOSIT);
    assert_eq!(t.host.balance_of(&t.bob), 2 * DEPOSIT);

    // Too late to reveal now
    assert_eq!(
        contract_err(t.host.reveal(t.alice, Move::Rock, &t.secret).unwrap_err()),
        ContractError::CounterpartyNotMoved
    );

    t.host.withdraw(t.bob).await.unwrap();
    assert_eq!(t.rail.wallet(&t.bob), Some(WALLET + DEPOSIT));
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET - DEPOSIT));
    t.assert_books_balance();
}

#[tokio::test]
async fn test_player2_wins_by_reveal() {
    let t = Table::new();
    let id = t.commit_and_play(Move::Rock, Move::Paper).await;

    assert_eq!(
        t.host.reveal(t.alice, Move::Rock, &t.secret).unwrap(),
        Outcome::Player2Wins
    );
    assert_eq!(
        t.host.events().last(),
        Some(&ContractEvent::WinnerDeclared {
            game_id: id,
            winner: t.bob,
            winnings: 2 * DEPOSIT,
        })
    );

    assert_eq!(
        contract_err(t.host.reclaim_funds(t.alice, id).unwrap_err()),
        ContractError::NoFunds
    );
    assert_eq!(
        contract_err(t.host.claim_funds(t.alice, id).unwrap_err()),
        ContractError::CounterpartyNotMoved
    );
    assert_eq!(
        contract_err(t.host.withdraw(t.alice).await.unwrap_err()),
        ContractError::NothingToWithdraw
    );

    assert_eq!(t.host.withdraw(t.bob).await.unwrap(), 2 * DEPOSIT);
    assert_eq!(
        contract_err(t.host.withdraw(t.bob).await.unwrap_err()),
        ContractError::NothingToWithdraw
    );
    t.assert_books_balance();
}

#[tokio::test]
async fn test_rejected_deposit_is_returned() {
    let t = Table::new();
    let id = t.commit(Move::Scissors).await;

    let err = t
        .host
        .commit_move(t.alice, id, t.bob, DEPOSIT)
        .await
        .unwrap_err();
    assert_eq!(contract_err(err), ContractError::GameIdAlreadyUsed);
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET - DEPOSIT));

    let err = t
        .host
        .play_move(t.bob, id, Move::Rock, DEPOSIT + 1)
        .await
        .unwrap_err();
    assert_eq!(
        contract_err(err),
        ContractError::DepositMismatch {
            expected: DEPOSIT,
            attached: DEPOSIT + 1
        }
    );
    assert_eq!(t.rail.wallet(&t.bob), Some(WALLET));
    t.assert_books_balance();
}

#[tokio::test]
async fn test_deposit_beyond_wallet_is_refused() {
    let t = Table::new();
    let id = generate_commitment(&t.alice, Move::Rock, &t.secret);

    let err = t
        .host
        .commit_move(t.alice, id, t.bob, WALLET + 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HostError::Payment(PaymentError::InsufficientFunds { .. })
    ));
    assert!(t.host.game(&id).is_none());
}

#[tokio::test]
async fn test_pause_blocks_new_games_only() {
    let t = Table::new();
    let id = t.commit_and_play(Move::Paper, Move::Rock).await;

    t.host.pause(t.owner).unwrap();
    let other = generate_commitment(&t.alice, Move::Rock, &Secret::random());
    assert_eq!(
        contract_err(
            t.host
                .commit_move(t.alice, other, t.bob, DEPOSIT)
                .await
                .unwrap_err()
        ),
        ContractError::Paused
    );
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET - DEPOSIT));

    // Exits stay open while paused
    assert_eq!(
        t.host.reveal(t.alice, Move::Paper, &t.secret).unwrap(),
        Outcome::Player1Wins
    );
    assert_eq!(t.host.withdraw(t.alice).await.unwrap(), 2 * DEPOSIT);

    t.host.resume(t.owner).unwrap();
    t.host
        .commit_move(t.alice, other, t.bob, DEPOSIT)
        .await
        .unwrap();
    assert!(t.host.game(&id).is_none());
    assert!(t.host.game(&other).is_some());
}

#[tokio::test]
async fn test_failed_payout_restores_balance() {
    let t = Table::new();
    let id = t.commit(Move::Rock).await;
    t.clock.advance(11 * 60);
    t.host.reclaim_funds(t.alice, id).unwrap();
    let events_before = t.host.events().len();

    t.rail.reject_payouts(true);
    let err = t.host.withdraw(t.alice).await.unwrap_err();
    assert!(matches!(err, HostError::Payment(PaymentError::Rejected(_))));
    assert_eq!(t.host.balance_of(&t.alice), DEPOSIT);
    assert_eq!(t.host.events().len(), events_before);

    t.rail.reject_payouts(false);
    assert_eq!(t.host.withdraw(t.alice).await.unwrap(), DEPOSIT);
    t.assert_books_balance();
}

#[tokio::test]
async fn test_unreturnable_deposit_is_credited() {
    let t = Table::new();
    let id = t.commit(Move::Rock).await;

    t.rail.reject_payouts(true);
    let err = t
        .host
        .commit_move(t.alice, id, t.bob, DEPOSIT)
        .await
        .unwrap_err();
    assert_eq!(contract_err(err), ContractError::GameIdAlreadyUsed);
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET - 2 * DEPOSIT));
    assert_eq!(t.host.balance_of(&t.alice), DEPOSIT);
    assert_eq!(
        t.host.events().last(),
        Some(&ContractEvent::DepositCredited {
            player: t.alice,
            amount: DEPOSIT,
        })
    );
    t.assert_books_balance();

    t.rail.reject_payouts(false);
    assert_eq!(t.host.withdraw(t.alice).await.unwrap(), DEPOSIT);
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET - DEPOSIT));
    t.assert_books_balance();
}

#[tokio::test]
async fn test_two_games_paid_in_one_withdrawal() {
    let t = Table::new();
    let carol = Identity::new();
    t.rail.fund(carol, WALLET);

    let vs_bob = t.commit_and_play(Move::Rock, Move::Scissors).await;
    let carol_secret = Secret::from_padded(b"AliceSecond&").unwrap();
    let vs_carol = generate_commitment(&t.alice, Move::Paper, &carol_secret);
    t.host
        .commit_move(t.alice, vs_carol, carol, DEPOSIT)
        .await
        .unwrap();
    t.host
        .play_move(carol, vs_carol, Move::Rock, DEPOSIT)
        .await
        .unwrap();
    assert_eq!(t.rail.custody(), 4 * DEPOSIT);

    assert_eq!(
        t.host.reveal(t.alice, Move::Rock, &t.secret).unwrap(),
        Outcome::Player1Wins
    );
    assert_eq!(
        t.host.reveal(t.alice, Move::Paper, &carol_secret).unwrap(),
        Outcome::Player1Wins
    );
    assert!(t.host.game(&vs_bob).is_none());
    assert!(t.host.game(&vs_carol).is_none());
    assert_eq!(t.host.balance_of(&t.alice), 4 * DEPOSIT);

    assert_eq!(t.host.withdraw(t.alice).await.unwrap(), 4 * DEPOSIT);
    assert_eq!(t.rail.wallet(&t.alice), Some(WALLET + 2 * DEPOSIT));
    assert_eq!(t.rail.wallet(&t.bob), Some(WALLET - DEPOSIT));
    assert_eq!(t.rail.wallet(&carol), Some(WALLET - DEPOSIT));
    assert_eq!(
        contract_err(t.host.withdraw(t.alice).await.unwrap_err()),
        ContractError::NothingToWithdraw
    );
    t.assert_books_balance();
}

/// Rail whose payout calls back into the host before completing
struct ReentrantRail {
    inner: MockPaymentRail,
    host: OnceLock<GameHost>,
    entered: AtomicBool,
    reentry: parking_lot::Mutex<Option<Result<Amount, String>>>,
    conserved_in_flight: parking_lot::Mutex<Option<bool>>,
}

#[async_trait]
impl PaymentRail for ReentrantRail {
    async fn collect(&self, from: &Identity, amount: Amount) -> Result<PaymentId, PaymentError> {
        self.inner.collect(from, amount).await
    }

    async fn pay(&self, to: &Identity, amount: Amount) -> Result<PaymentId, PaymentError> {
        if !self.entered.swap(true, Ordering::SeqCst) {
            if let Some(host) = self.host.get() {
                *self.conserved_in_flight.lock() = Some(host.inspect(|c| c.is_conserved()));
                let again = host.withdraw(*to).await.map_err(|e| e.to_string());
                *self.reentry.lock() = Some(again);
            }
        }
        self.inner.pay(to, amount).await
    }
}

#[tokio::test]
async fn test_reentrant_withdrawal_finds_nothing() {
    let inner = MockPaymentRail::new();
    let clock = MockClock::default();
    let alice = Identity::new();
    let bob = Identity::new();
    inner.fund(alice, WALLET);
    inner.fund(bob, WALLET);
    let rail = Arc::new(ReentrantRail {
        inner: inner.clone(),
        host: OnceLock::new(),
        entered: AtomicBool::new(false),
        reentry: parking_lot::Mutex::new(None),
        conserved_in_flight: parking_lot::Mutex::new(None),
    });
    let host = GameHost::new(Identity::new(), Arc::new(clock.clone()), rail.clone());
    assert!(rail.host.set(host.clone()).is_ok());

    let secret = Secret::random();
    let id = generate_commitment(&alice, Move::Scissors, &secret);
    host.commit_move(alice, id, bob, DEPOSIT).await.unwrap();
    host.play_move(bob, id, Move::Paper, DEPOSIT).await.unwrap();
    host.reveal(alice, Move::Scissors, &secret).unwrap();

    assert_eq!(host.withdraw(alice).await.unwrap(), 2 * DEPOSIT);
    assert_eq!(
        rail.reentry.lock().clone(),
        Some(Err(ContractError::NothingToWithdraw.to_string()))
    );
    assert_eq!(*rail.conserved_in_flight.lock(), Some(true));
    assert_eq!(inner.wallet(&alice), Some(WALLET + DEPOSIT));
    let settled = host
        .events()
        .iter()
        .filter(|e| matches!(e, ContractEvent::WithdrawalSettled { .. }))
        .count();
    assert_eq!(settled, 1);
}

struct Commitment {
    player1: Identity,
    player2: Identity,
    game_move: Move,
    secret: Secret,
    id: GameId,
}

fn random_move(rng: &mut StdRng) -> Move {
    match rng.gen_range(0..3) {
        0 => Move::Rock,
        1 => Move::Paper,
        _ => Move::Scissors,
    }
}

#[tokio::test]
async fn test_random_sessions_conserve_funds() {
    let mut rng = StdRng::seed_from_u64(7);
    let rail = MockPaymentRail::new();
    let clock = MockClock::default();
    let owner = Identity::new();
    let host = GameHost::new(owner, Arc::new(clock.clone()), Arc::new(rail.clone()));
    let players: Vec<Identity> = (0..4).map(|_| Identity::new()).collect();
    for p in &players {
        rail.fund(*p, WALLET);
    }
    let mut open: Vec<Commitment> = Vec::new();

    for _ in 0..400 {
        match rng.gen_range(0..8) {
            0 | 1 => {
                let player1 = players[rng.gen_range(0..players.len())];
                let player2 = players[rng.gen_range(0..players.len())];
                let game_move = random_move(&mut rng);
                let secret = Secret::random();
                let id = generate_commitment(&player1, game_move, &secret);
                let deposit = rng.gen_range(0..5) * 1_000;
                if host.commit_move(player1, id, player2, deposit).await.is_ok() {
                    open.push(Commitment {
                        player1,
                        player2,
                        game_move,
                        secret,
                        id,
                    });
                }
            }
            2 | 3 if !open.is_empty() => {
                let c = &open[rng.gen_range(0..open.len())];
                let deposit = host.game(&c.id).map(|g| g.deposit).unwrap_or(1);
                let _ = host
                    .play_move(c.player2, c.id, random_move(&mut rng), deposit)
                    .await;
            }
            4 if !open.is_empty() => {
                let c = &open[rng.gen_range(0..open.len())];
                let _ = host.reveal(c.player1, c.game_move, &c.secret);
            }
            5 if !open.is_empty() => {
                let c = &open[rng.gen_range(0..open.len())];
                let _ = host.reclaim_funds(c.player1, c.id);
                let _ = host.claim_funds(c.player2, c.id);
            }
            6 => {
                let who = players[rng.gen_range(0..players.len())];
                let _ = host.withdraw(who).await;
            }
            _ => clock.advance(rng.gen_range(0..400)),
        }
        open.retain(|c| host.game(&c.id).is_some());

        host.inspect(|contract| {
            assert!(contract.is_conserved());
            assert_eq!(rail.custody(), contract.ledger_total() + contract.escrowed());
        });
    }

    let total: Amount = players.iter().filter_map(|p| rail.wallet(p)).sum();
    assert_eq!(total + rail.custody(), WALLET * players.len() as Amount);
}
