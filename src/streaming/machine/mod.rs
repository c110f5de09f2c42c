//! Push channel connection state machine.
//!
//! This is the **functional core** of the stream connector:
//! - **Input**: `StreamEvent` (what happened to the channel).
//! - **Output**: `Vec<StreamCommand>` (what the shell must do about it).
//!
//! # Guarantees
//! * **No IO**: never opens a connection or starts a timer itself.
//! * **No async**: every transition is a plain function call.
//! * **Deterministic**: the same event sequence always yields the same
//!   states and commands, so backoff and retry exhaustion are testable
//!   without sockets or real time.

mod logic;
pub mod state;
pub mod types;


pub use types::{ConnectionState, StreamCommand, StreamEvent};

use state::MachineState;

#[derive(Debug, Clone)]
pub struct StreamMachine {
    state: MachineState,
}

impl StreamMachine {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: MachineState {
                state: ConnectionState::Disconnected,
                retry_count: 0,
                max_retries,
                last_error: None,
            },
        }
    }

    /// Feeds one event and returns the commands to execute, in order.
    pub fn handle_event(&mut self, event: StreamEvent) -> Vec<StreamCommand> {
        match event {
            StreamEvent::Start => logic::on_start(&mut self.state),
            StreamEvent::Opened => logic::on_opened(&mut self.state),
            StreamEvent::Failed(reason) => logic::on_failed(&mut self.state, reason),
            StreamEvent::RetryDue => logic::on_retry_due(&mut self.state),
            StreamEvent::Stop => logic::on_stop(&mut self.state),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.state
    }

    pub fn retry_count(&self) -> u32 {
        self.state.retry_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }
}
