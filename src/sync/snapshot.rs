use std::sync::Arc;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};
use crate::ledger::api::LedgerApi;
use crate::ledger::types::{EscrowBalance, LedgerSnapshot, RentalSession};

/// Reads balance and rentals for one address and merges them.
#[derive(Clone)]
pub struct SnapshotFetcher {
    api: Arc<dyn LedgerApi>,
    timeout: Duration,
}

impl SnapshotFetcher {
    pub fn new(api: Arc<dyn LedgerApi>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// Both reads run concurrently and both must succeed; a partial result
    /// is never returned.
    pub async fn fetch_snapshot(&self, address: &str) -> SyncResult<LedgerSnapshot> {
        if address.is_empty() {
            return Err(SyncError::Config("no wallet address available".into()));
        }

        let reads = async {
            tokio::try_join!(
                self.api.fetch_balance(address),
                self.api.fetch_rentals(address)
            )
        };

        let (balance, rentals) = tokio::time::timeout(self.timeout, reads)
            .await
            .map_err(|_| SyncError::Timeout(self.timeout))??;

        let snapshot = derive_snapshot(address, &balance, &rentals);
        log::debug!(
            "[FETCH] {}: available={} active_rentals={} rate={}/h",
            address,
            snapshot.available,
            snapshot.active_rentals,
            snapshot.earnings_per_hour
        );
        Ok(snapshot)
    }
}

/// Builds a snapshot from the two wire reads.
///
/// Rentals count toward the live rate only while provisioning or running and
/// only when owned by `address` (compared case-insensitively).
pub fn derive_snapshot(
    address: &str,
    balance: &EscrowBalance,
    rentals: &[RentalSession],
) -> LedgerSnapshot {
    let (active_rentals, earnings_per_hour) = rentals
        .iter()
        .filter(|r| r.is_active_for(address))
        .fold((0u32, 0.0f64), |(n, rate), r| (n + 1, rate + r.rate_per_hour));

    LedgerSnapshot {
        available: balance.available,
        total_earned: balance.total_earned,
        total_withdrawn: balance.total_withdrawn,
        active_rentals,
        earnings_per_hour,
        as_of: balance.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedgerApi;
    use crate::ledger::types::RentalStatus;

    const ADDR: &str = "0xAbC123";

    fn balance() -> EscrowBalance {
        EscrowBalance {
            available: 100.0,
            total_earned: 150.0,
            total_withdrawn: 50.0,
            updated_at: None,
        }
    }

    fn rental(id: &str, owner: &str, status: RentalStatus, rate: f64) -> RentalSession {
        RentalSession {
            id: id.into(),
            owner_address: owner.into(),
            status,
            rate_per_hour: rate,
        }
    }

    #[test]
    fn only_active_owned_rentals_count() {
        let rentals = vec![
            rental("a", "0xabc123", RentalStatus::Running, 1.5),
            rental("b", "0xABC123", RentalStatus::Provisioning, 0.5),
            rental("c", ADDR, RentalStatus::Completed, 9.0),
            rental("d", "0xother", RentalStatus::Running, 9.0),
            rental("e", ADDR, RentalStatus::Other, 9.0),
        ];

        let s = derive_snapshot(ADDR, &balance(), &rentals);
        assert_eq!(s.active_rentals, 2);
        assert_eq!(s.earnings_per_hour, 2.0);
        assert_eq!(s.available, 100.0);
        assert!(s.is_balanced());
    }

    #[tokio::test]
    async fn fetch_merges_both_reads() {
        let api = MockLedgerApi::new(balance(), vec![rental("a", ADDR, RentalStatus::Running, 3.0)]);
        let fetcher = SnapshotFetcher::new(Arc::new(api.clone()), Duration::from_secs(5));

        let s = fetcher.fetch_snapshot(ADDR).await.unwrap();
        assert_eq!(s.active_rentals, 1);
        assert_eq!(s.earnings_per_hour, 3.0);
        assert_eq!((api.balance_calls(), api.rentals_calls()), (1, 1));
    }

    #[tokio::test]
    async fn rentals_failure_fails_whole_fetch() {
        let api = MockLedgerApi::new(balance(), vec![]);
        api.fail_rentals(502);
        let fetcher = SnapshotFetcher::new(Arc::new(api), Duration::from_secs(5));

        let err = fetcher.fetch_snapshot(ADDR).await.unwrap_err();
        assert!(matches!(err, SyncError::Server { status: 502, .. }));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn repeated_fetch_is_identical() {
        let api = MockLedgerApi::new(balance(), vec![rental("a", ADDR, RentalStatus::Running, 3.0)]);
        let fetcher = SnapshotFetcher::new(Arc::new(api), Duration::from_secs(5));

        let a = fetcher.fetch_snapshot(ADDR).await.unwrap();
        let b = fetcher.fetch_snapshot(ADDR).await.unwrap();
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    struct HangingApi;

    #[async_trait::async_trait]
    impl LedgerApi for HangingApi {
        async fn fetch_balance(&self, _address: &str) -> SyncResult<EscrowBalance> {
            std::future::pending().await
        }

        async fn fetch_rentals(&self, _address: &str) -> SyncResult<Vec<RentalSession>> {
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_read_times_out() {
        let fetcher = SnapshotFetcher::new(Arc::new(HangingApi), Duration::from_secs(15));
        let err = fetcher.fetch_snapshot(ADDR).await.unwrap_err();
        assert_eq!(err, SyncError::Timeout(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn empty_address_is_a_config_error() {
        let api = MockLedgerApi::new(balance(), vec![]);
        let fetcher = SnapshotFetcher::new(Arc::new(api.clone()), Duration::from_secs(5));

        assert!(matches!(
            fetcher.fetch_snapshot("").await,
            Err(SyncError::Config(_))
        ));
        assert_eq!(api.balance_calls(), 0);
    }
}
