use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while keeping the earnings view in sync.
///
/// None of these are fatal: the orchestrator logs them and degrades
/// (stale snapshot, polling-only) instead of stopping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// The request never produced a response (DNS, connect, reset, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The ledger answered with a non-success status.
    #[error("ledger returned HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A REST body that does not match the expected shape.
    #[error("could not decode ledger response: {0}")]
    Decode(String),

    /// The push channel failed or was closed.
    #[error("event stream error: {0}")]
    Stream(String),

    /// A push message that is not a valid ledger event.
    #[error("malformed ledger event: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Failures of the REST snapshot path (as opposed to the push channel).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_)
                | SyncError::Server { .. }
                | SyncError::Timeout(_)
                | SyncError::Decode(_)
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Server {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err.to_string())
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
