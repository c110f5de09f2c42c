pub mod backoff;
pub mod channel;
pub mod connector;
pub mod machine;
pub mod sse;

#[cfg(test)]
pub mod mock;

pub use backoff::backoff_delay;
pub use channel::{PushChannel, PushChannelFactory};
pub use machine::{ConnectionState, StreamCommand, StreamEvent, StreamMachine};
