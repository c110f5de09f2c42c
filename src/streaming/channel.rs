use async_trait::async_trait;

use crate::error::SyncResult;

/// One open push channel scoped to a single address.
#[async_trait]
pub trait PushChannel: Send {
    /// Next raw message payload.
    ///
    /// Returns `None` once the server closed the stream, `Some(Err(_))` when
    /// the transport failed.
    async fn next_message(&mut self) -> Option<SyncResult<String>>;
}

/// Opens push channels. Injected so tests can script the stream.
#[async_trait]
pub trait PushChannelFactory: Send + Sync {
    async fn open(&self, address: &str) -> SyncResult<Box<dyn PushChannel>>;
}
