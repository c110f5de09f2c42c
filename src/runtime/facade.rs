use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::address::AddressSource;
use crate::clock::{Clock, TokioClock};
use crate::config::SyncConfig;
use crate::ledger::api::LedgerApi;
use crate::runtime::orchestrator::{Control, Inputs, SyncOrchestrator};
use crate::runtime::view::EarningsView;
use crate::streaming::channel::PushChannelFactory;
use crate::sync::snapshot::SnapshotFetcher;

/// Public handle to a running earnings sync engine.
///
/// Owns the orchestrator task. Dropping the handle aborts it, which in turn
/// aborts the push channel, retry timer, poll timer and in-flight fetches.
pub struct EarningsSync {
    control: mpsc::UnboundedSender<Control>,
    view: watch::Receiver<EarningsView>,
    driver: Option<JoinHandle<()>>,
}

impl EarningsSync {
    pub fn builder(
        api: Arc<dyn LedgerApi>,
        channels: Arc<dyn PushChannelFactory>,
    ) -> EarningsSyncBuilder {
        EarningsSyncBuilder {
            api,
            channels,
            config: SyncConfig::default(),
            clock: Arc::new(TokioClock),
        }
    }

    /// Current state.
    pub fn view(&self) -> EarningsView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<EarningsView> {
        self.view.clone()
    }

    /// Fetch a fresh snapshot now, outside the poll schedule.
    pub fn refresh(&self) {
        self.send(Control::Refresh);
    }

    pub fn set_polling_enabled(&self, enabled: bool) {
        self.send(Control::SetPolling(enabled));
    }

    /// Reconnect the push channel, also out of the terminal error state.
    pub fn restart_stream(&self) {
        self.send(Control::RestartStream);
    }

    /// Stops the engine and waits until every background task is released.
    pub async fn shutdown(mut self) {
        self.send(Control::Shutdown);
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                log::error!("[SYNC] orchestrator ended abnormally: {}", e);
            }
        }
    }

    fn send(&self, cmd: Control) {
        if self.control.send(cmd).is_err() {
            log::warn!("[SYNC] engine is not running; control request dropped");
        }
    }
}

impl Drop for EarningsSync {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

pub struct EarningsSyncBuilder {
    api: Arc<dyn LedgerApi>,
    channels: Arc<dyn PushChannelFactory>,
    config: SyncConfig,
    clock: Arc<dyn Clock>,
}

impl EarningsSyncBuilder {
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the engine on the current tokio runtime, bound to `addresses`.
    pub fn spawn(self, addresses: &dyn AddressSource) -> EarningsSync {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(EarningsView {
            polling_enabled: self.config.polling_enabled,
            ..EarningsView::default()
        });

        let fetcher = SnapshotFetcher::new(self.api, self.config.fetch_timeout);
        let orchestrator =
            SyncOrchestrator::new(self.config, fetcher, self.channels, self.clock, view_tx);

        let inputs = Inputs {
            address: addresses.subscribe(),
            control: control_rx,
        };

        let driver = tokio::spawn(orchestrator.run(inputs));

        EarningsSync {
            control: control_tx,
            view: view_rx,
            driver: Some(driver),
        }
    }
}
