use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::types::{LedgerEvent, LedgerSnapshot};
use crate::streaming::machine::ConnectionState;

/// Everything the presentation layer reads, published as one value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EarningsView {
    pub address: Option<String>,
    pub earnings: Option<LedgerSnapshot>,
    pub is_loading: bool,
    pub is_live: bool,
    pub last_updated: Option<DateTime<Utc>>,
    /// Newest first.
    pub recent_events: Vec<LedgerEvent>,
    pub connection_status: ConnectionState,
    pub connection_error: Option<String>,
    pub polling_enabled: bool,
}
