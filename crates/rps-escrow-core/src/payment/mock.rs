//! In-memory payment rail for tests and the demo service.

use super::traits::{PaymentError, PaymentId, PaymentRail};
use crate::protocol::{Amount, Identity};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Books {
    wallets: HashMap<Identity, Amount>,
    custody: Amount,
}

/// In-memory wallets plus a custody account
#[derive(Clone, Default)]
pub struct MockPaymentRail {
    books: Arc<Mutex<Books>>,
    /// When set, payouts fail (collections still work)
    reject_payouts: Arc<AtomicBool>,
}

impl MockPaymentRail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or top up) a wallet
    pub fn fund(&self, who: Identity, amount: Amount) {
        let mut books = self.books.lock();
        let wallet = books.wallets.entry(who).or_insert(0);
        *wallet = wallet.saturating_add(amount);
    }

    /// Wallet balance, `None` if the wallet was never opened
    pub fn wallet(&self, who: &Identity) -> Option<Amount> {
        self.books.lock().wallets.get(who).copied()
    }

    /// Value currently held in custody
    pub fn custody(&self) -> Amount {
        self.books.lock().custody
    }

    /// Make subsequent payouts fail, to simulate a refusing recipient
    pub fn reject_payouts(&self, reject: bool) {
        self.reject_payouts.store(reject, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentRail for MockPaymentRail {
    async fn collect(&self, from: &Identity, amount: Amount) -> Result<PaymentId, PaymentError> {
        let mut books = self.books.lock();
        let available = *books
            .wallets
            .get(from)
            .ok_or(PaymentError::UnknownWallet(*from))?;
        if available < amount {
            return Err(PaymentError::InsufficientFunds {
                need: amount,
                available,
            });
        }
        books.wallets.insert(*from, available - amount);
        books.custody += amount;
        Ok(PaymentId::new())
    }

    async fn pay(&self, to: &Identity, amount: Amount) -> Result<PaymentId, PaymentError> {
        if self.reject_payouts.load(Ordering::SeqCst) {
            return Err(PaymentError::Rejected(format!("recipient {} refused", to)));
        }
        let mut books = self.books.lock();
        if books.custody < amount {
            return Err(PaymentError::CustodyShortfall {
                need: amount,
                held: books.custody,
            });
        }
        books.custody -= amount;
        let wallet = books.wallets.entry(*to).or_insert(0);
        *wallet = wallet.saturating_add(amount);
        Ok(PaymentId::new())
    }
}
