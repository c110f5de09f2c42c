pub mod api;
pub mod http_client;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use api::LedgerApi;
pub use http_client::HttpLedgerClient;
pub use types::{
    EscrowBalance, EventKind, LedgerEvent, LedgerSnapshot, RentalSession, RentalStatus,
};
