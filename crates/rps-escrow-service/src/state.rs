//! Application state management.

use chrono::{DateTime, Utc};
use rps_escrow_core::{Amount, Clock, GameHost, Identity, MockClock, MockPaymentRail};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    host: GameHost,
    rail: MockPaymentRail,
    /// Simulated current time (for timeout testing)
    clock: MockClock,
    wallet_funding: Amount,
}

impl AppState {
    pub fn new(owner: Identity, wallet_funding: Amount) -> Self {
        let rail = MockPaymentRail::new();
        let clock = MockClock::default();
        Self {
            host: GameHost::new(owner, Arc::new(clock.clone()), Arc::new(rail.clone())),
            rail,
            clock,
            wallet_funding,
        }
    }

    pub fn host(&self) -> &GameHost {
        &self.host
    }

    pub fn rail(&self) -> &MockPaymentRail {
        &self.rail
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Advance simulated time by seconds
    pub fn advance_time(&self, seconds: i64) {
        self.clock.advance(seconds);
    }

    /// Open a funded wallet for a fresh identity
    pub fn register_wallet(&self) -> Identity {
        let identity = Identity::new();
        self.rail.fund(identity, self.wallet_funding);
        identity
    }
}
