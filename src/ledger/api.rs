use async_trait::async_trait;

use crate::error::SyncResult;
use crate::ledger::types::{EscrowBalance, RentalSession};

/// Minimal ledger read interface used by the snapshot fetcher.
/// Everything is keyed by wallet address.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Escrow balance for `address`.
    async fn fetch_balance(&self, address: &str) -> SyncResult<EscrowBalance>;

    /// Every rental session the ledger associates with `address`, any status.
    async fn fetch_rentals(&self, address: &str) -> SyncResult<Vec<RentalSession>>;
}
