use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{SyncError, SyncResult};
use crate::streaming::channel::{PushChannel, PushChannelFactory};

/// What the next `open()` call does.
enum ChannelScript {
    Refuse(String),
    Live(mpsc::UnboundedReceiver<SyncResult<String>>),
}

/// Scripted push channel factory for tests.
///
/// Each `open()` consumes one script in order. With no script queued it
/// either refuses (`refuse_all`) or hands out a channel that stays silent.
#[derive(Clone, Default)]
pub struct MockChannelFactory {
    inner: Arc<Mutex<MockChannelState>>,
}

#[derive(Default)]
struct MockChannelState {
    scripts: VecDeque<ChannelScript>,
    opened: Vec<String>,
    refuse_all: bool,
    /// Keeps silent channels open.
    idle: Vec<mpsc::UnboundedSender<SyncResult<String>>>,
}

impl MockChannelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_next(&self, reason: &str) {
        let mut s = self.inner.lock().unwrap();
        s.scripts.push_back(ChannelScript::Refuse(reason.to_string()));
    }

    /// Queue a channel driven by the returned sender.
    /// Dropping the sender closes the channel from the server side.
    pub fn push_live(&self) -> mpsc::UnboundedSender<SyncResult<String>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().scripts.push_back(ChannelScript::Live(rx));
        tx
    }

    pub fn refuse_all(&self) {
        self.inner.lock().unwrap().refuse_all = true;
    }

    pub fn open_count(&self) -> usize {
        self.inner.lock().unwrap().opened.len()
    }

    pub fn opened(&self) -> Vec<String> {
        self.inner.lock().unwrap().opened.clone()
    }
}

#[async_trait]
impl PushChannelFactory for MockChannelFactory {
    async fn open(&self, address: &str) -> SyncResult<Box<dyn PushChannel>> {
        let mut s = self.inner.lock().unwrap();
        s.opened.push(address.to_string());

        match s.scripts.pop_front() {
            Some(ChannelScript::Refuse(reason)) => Err(SyncError::Stream(reason)),
            Some(ChannelScript::Live(rx)) => Ok(Box::new(MockChannel { rx })),
            None if s.refuse_all => Err(SyncError::Stream("connection refused".into())),
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                s.idle.push(tx);
                Ok(Box::new(MockChannel { rx }))
            }
        }
    }
}

struct MockChannel {
    rx: mpsc::UnboundedReceiver<SyncResult<String>>,
}

#[async_trait]
impl PushChannel for MockChannel {
    async fn next_message(&mut self) -> Option<SyncResult<String>> {
        self.rx.recv().await
    }
}
