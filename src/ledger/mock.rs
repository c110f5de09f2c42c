use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};
use crate::ledger::api::LedgerApi;
use crate::ledger::types::{EscrowBalance, RentalSession};

/// Pure in-memory ledger for tests.
///
/// Clones share state, so a test can keep one handle and change the
/// server's answers while the engine holds another.
#[derive(Clone)]
pub struct MockLedgerApi {
    inner: Arc<Mutex<MockLedgerState>>,
}

struct MockLedgerState {
    balance: SyncResult<EscrowBalance>,
    rentals: SyncResult<Vec<RentalSession>>,
    balance_calls: Vec<String>,
    rentals_calls: Vec<String>,
    /// Per-address latency of the balance read.
    balance_delay: HashMap<String, Duration>,
}

impl MockLedgerApi {
    pub fn new(balance: EscrowBalance, rentals: Vec<RentalSession>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockLedgerState {
                balance: Ok(balance),
                rentals: Ok(rentals),
                balance_calls: Vec::new(),
                rentals_calls: Vec::new(),
                balance_delay: HashMap::new(),
            })),
        }
    }

    pub fn set_balance(&self, balance: SyncResult<EscrowBalance>) {
        self.inner.lock().unwrap().balance = balance;
    }

    pub fn set_rentals(&self, rentals: SyncResult<Vec<RentalSession>>) {
        self.inner.lock().unwrap().rentals = rentals;
    }

    pub fn fail_rentals(&self, status: u16) {
        self.set_rentals(Err(SyncError::Server {
            status,
            body: "rentals unavailable".into(),
        }));
    }

    /// Balance reads for `address` answer only after `delay`. The answer is
    /// taken when the read starts.
    pub fn slow_balance(&self, address: &str, delay: Duration) {
        self.inner
            .lock()
            .unwrap()
            .balance_delay
            .insert(address.to_string(), delay);
    }

    pub fn balance_calls(&self) -> usize {
        self.inner.lock().unwrap().balance_calls.len()
    }

    pub fn rentals_calls(&self) -> usize {
        self.inner.lock().unwrap().rentals_calls.len()
    }

    pub fn last_address(&self) -> Option<String> {
        self.inner.lock().unwrap().balance_calls.last().cloned()
    }
}

#[async_trait]
impl LedgerApi for MockLedgerApi {
    async fn fetch_balance(&self, address: &str) -> SyncResult<EscrowBalance> {
        let (answer, delay) = {
            let mut s = self.inner.lock().unwrap();
            s.balance_calls.push(address.to_string());
            (s.balance.clone(), s.balance_delay.get(address).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }

    async fn fetch_rentals(&self, address: &str) -> SyncResult<Vec<RentalSession>> {
        let mut s = self.inner.lock().unwrap();
        s.rentals_calls.push(address.to_string());
        s.rentals.clone()
    }
}
