use crate::streaming::machine::types::ConnectionState;

#[derive(Debug, Clone)]
pub struct MachineState {
    pub state: ConnectionState,

    /// Consecutive failures since the last successful open.
    pub retry_count: u32,
    pub max_retries: u32,

    /// Surfaced to the UI as `connection_error`.
    pub last_error: Option<String>,
}
