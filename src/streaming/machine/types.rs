use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Retrying,
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Retrying => "retrying",
            ConnectionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Signals fed into the stream machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Start,
    Opened,
    Failed(String),
    RetryDue,
    Stop,
}

/// Side effects the shell must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamCommand {
    OpenChannel,
    CloseChannel,
    ScheduleRetry { attempt: u32, delay: Duration },
    CancelRetry,
    /// Retries exhausted; only the poll path is left.
    FallBackToPolling,
}
