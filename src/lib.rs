//! Real-time earnings synchronization for GPU marketplace providers.
//!
//! Keeps a provider's balance view consistent with the remote ledger using
//! a push event stream plus a periodic snapshot resync.

pub mod address;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod polling;
pub mod runtime;
pub mod streaming;
pub mod sync;

pub use address::{AddressSource, WalletSession};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use ledger::{HttpLedgerClient, LedgerEvent, LedgerSnapshot};
pub use runtime::{EarningsSync, EarningsView};
pub use streaming::ConnectionState;
