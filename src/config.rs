use std::time::Duration;

use crate::error::{SyncError, SyncResult};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Runtime knobs for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the ledger service, without trailing slash.
    pub api_base: String,

    /// Period of the drift-correcting snapshot refresh.
    pub poll_interval: Duration,

    /// Consecutive stream failures tolerated before falling back to polling-only.
    pub max_retries: u32,

    /// Upper bound for each snapshot fetch.
    pub fetch_timeout: Duration,

    /// Initial value of the polling flag.
    pub polling_enabled: bool,

    /// Number of applied events kept for display.
    pub history_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            polling_enabled: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl SyncConfig {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.api_base.is_empty() {
            return Err(SyncError::Config("api base URL is empty".into()));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "api base URL must be http(s): {}",
                self.api_base
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(SyncError::Config("poll interval must be non-zero".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(SyncError::Config("fetch timeout must be non-zero".into()));
        }
        if self.history_capacity == 0 {
            return Err(SyncError::Config("history capacity must be at least 1".into()));
        }
        Ok(())
    }
}
