//! Current-account source.
//!
//! The wallet/identity provider owns the address; the engine only observes
//! it. Observation goes through a `watch` channel so changes and losses are
//! delivered in order and the latest value is always readable.

use tokio::sync::watch;

pub trait AddressSource: Send + Sync {
    /// Receiver yielding the current address (`None` while signed out).
    fn subscribe(&self) -> watch::Receiver<Option<String>>;
}

/// In-process wallet session: the address half of the identity provider.
#[derive(Debug)]
pub struct WalletSession {
    tx: watch::Sender<Option<String>>,
}

impl WalletSession {
    pub fn new(initial: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.filter(|a| !a.is_empty()));
        Self { tx }
    }

    pub fn connect(&self, address: impl Into<String>) {
        let address = address.into();
        if address.is_empty() {
            self.disconnect();
            return;
        }
        log::info!("[WALLET] connected {}", address);
        self.tx.send_replace(Some(address));
    }

    pub fn disconnect(&self) {
        log::info!("[WALLET] disconnected");
        self.tx.send_replace(None);
    }

    pub fn address(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl AddressSource for WalletSession {
    fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}
