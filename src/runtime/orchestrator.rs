use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::ledger::types::{LedgerEvent, LedgerSnapshot};
use crate::polling::PollScheduler;
use crate::runtime::tasks::TaskSlot;
use crate::runtime::view::EarningsView;
use crate::streaming::channel::PushChannelFactory;
use crate::streaming::connector::{spawn_channel, ChannelSignal, TaggedSignal};
use crate::streaming::machine::{StreamCommand, StreamEvent, StreamMachine};
use crate::sync::reconciler::{Applied, EventReconciler};
use crate::sync::snapshot::SnapshotFetcher;

/// Requests from the facade.
#[derive(Debug)]
pub enum Control {
    Refresh,
    SetPolling(bool),
    RestartStream,
    Shutdown,
}

/// Receivers the orchestrator consumes from the outside world.
pub struct Inputs {
    pub address: watch::Receiver<Option<String>>,
    pub control: mpsc::UnboundedReceiver<Control>,
}

/// A fetch result and the address epoch it was started for.
type FetchOutcome = (u64, SyncResult<LedgerSnapshot>);

/// **SyncOrchestrator**
///
/// The imperative shell around the pure parts of the engine. It:
/// 1. **Owns all mutable state**: the snapshot, the stream machine, the
///    event history and every background task.
/// 2. **Feeds the pure core**: channel signals go into `StreamMachine`,
///    decoded events into `EventReconciler`.
/// 3. **Executes side effects**: the commands the machine emits (open,
///    close, schedule retry) plus poll ticks and snapshot fetches.
///
/// It runs as a single task; every input arrives on a channel and is
/// handled to completion before the next one, so the poll path and the
/// stream path never interleave inside a mutation. They are not
/// otherwise coordinated: whichever write lands last wins.
pub struct SyncOrchestrator {
    fetcher: SnapshotFetcher,
    channels: Arc<dyn PushChannelFactory>,
    clock: Arc<dyn Clock>,
    scheduler: PollScheduler,

    machine: StreamMachine,
    reconciler: EventReconciler,

    /// Current account and a counter bumped on every change of it.
    address: Option<String>,
    epoch: u64,

    snapshot: Option<LedgerSnapshot>,
    is_live: bool,
    last_updated: Option<DateTime<Utc>>,
    polling_enabled: bool,

    /// Background work. Dropping the orchestrator aborts all of it.
    channel: TaskSlot,
    channel_id: u64,
    retry_timer: TaskSlot,
    retry_id: u64,
    poll_timer: TaskSlot,
    fetches: JoinSet<FetchOutcome>,

    signal_tx: mpsc::UnboundedSender<TaggedSignal>,
    signal_rx: mpsc::UnboundedReceiver<TaggedSignal>,
    retry_tx: mpsc::UnboundedSender<u64>,
    retry_rx: mpsc::UnboundedReceiver<u64>,
    tick_tx: mpsc::UnboundedSender<u64>,
    tick_rx: mpsc::UnboundedReceiver<u64>,

    view_tx: watch::Sender<EarningsView>,

    t0: Instant,
}

impl SyncOrchestrator {
    pub fn new(
        config: SyncConfig,
        fetcher: SnapshotFetcher,
        channels: Arc<dyn PushChannelFactory>,
        clock: Arc<dyn Clock>,
        view_tx: watch::Sender<EarningsView>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        Self {
            scheduler: PollScheduler::new(config.poll_interval, clock.clone()),
            machine: StreamMachine::new(config.max_retries),
            reconciler: EventReconciler::new(config.history_capacity),
            polling_enabled: config.polling_enabled,
            fetcher,
            channels,
            clock,
            address: None,
            epoch: 0,
            snapshot: None,
            is_live: false,
            last_updated: None,
            channel: TaskSlot::default(),
            channel_id: 0,
            retry_timer: TaskSlot::default(),
            retry_id: 0,
            poll_timer: TaskSlot::default(),
            fetches: JoinSet::new(),
            signal_tx,
            signal_rx,
            retry_tx,
            retry_rx,
            tick_tx,
            tick_rx,
            view_tx,
            t0: Instant::now(),
        }
    }

    /// The main event loop. Returns after `Control::Shutdown` or once the
    /// facade is gone; everything it started is torn down first.
    pub async fn run(mut self, mut inputs: Inputs) {
        self.info("starting");

        let initial = inputs.address.borrow_and_update().clone();
        self.on_address_changed(initial);
        self.publish();

        let mut address_open = true;

        loop {
            tokio::select! {
                changed = inputs.address.changed(), if address_open => {
                    match changed {
                        Ok(()) => {
                            let next = inputs.address.borrow_and_update().clone();
                            self.on_address_changed(next);
                        }
                        Err(_) => {
                            self.info("address source closed");
                            address_open = false;
                            self.on_address_changed(None);
                        }
                    }
                }

                control = inputs.control.recv() => {
                    match control {
                        Some(Control::Shutdown) | None => break,
                        Some(cmd) => self.on_control(cmd),
                    }
                }

                Some(tagged) = self.signal_rx.recv() => {
                    self.on_channel_signal(tagged);
                }

                Some(retry_id) = self.retry_rx.recv() => {
                    self.on_retry_timer(retry_id);
                }

                Some(epoch) = self.tick_rx.recv() => {
                    self.on_poll_tick(epoch);
                }

                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    match joined {
                        Ok((epoch, result)) => self.on_fetch_done(epoch, result),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => log::error!("[SYNC] fetch task panicked: {}", e),
                    }
                }
            }

            self.publish();
        }

        self.teardown();
        self.publish();
        self.info("stopped");
    }

    // ================================
    // Input handlers
    // ================================

    fn on_address_changed(&mut self, next: Option<String>) {
        let next = next.filter(|a| !a.is_empty());
        if next == self.address && self.epoch > 0 {
            return;
        }

        self.teardown();
        self.epoch += 1;
        self.snapshot = None;
        self.is_live = false;
        self.last_updated = None;
        self.reconciler.clear_history();
        self.address = next;

        match self.address.clone() {
            Some(addr) => {
                self.info(&format!("address {} (epoch {})", addr, self.epoch));
                self.drive_stream(StreamEvent::Start);
                if self.polling_enabled {
                    self.sync_polling();
                } else {
                    self.spawn_fetch();
                }
            }
            None => self.info("no address; idle"),
        }
    }

    fn on_control(&mut self, cmd: Control) {
        self.debug(&format!("control {:?}", cmd));
        match cmd {
            Control::Refresh => {
                if let Err(e) = self.require_address() {
                    log::warn!("[SYNC] refresh ignored: {}", e);
                    return;
                }
                self.spawn_fetch();
            }
            Control::SetPolling(enabled) => {
                self.polling_enabled = enabled;
                self.sync_polling();
            }
            Control::RestartStream => {
                if let Err(e) = self.require_address() {
                    log::warn!("[SYNC] stream restart ignored: {}", e);
                    return;
                }
                self.drive_stream(StreamEvent::Stop);
                self.drive_stream(StreamEvent::Start);
            }
            Control::Shutdown => {}
        }
    }

    fn on_channel_signal(&mut self, tagged: TaggedSignal) {
        if tagged.channel_id != self.channel_id {
            self.trace(&format!("dropping signal from closed channel #{}", tagged.channel_id));
            return;
        }

        match tagged.signal {
            ChannelSignal::Opened => self.drive_stream(StreamEvent::Opened),
            ChannelSignal::Message(payload) => match LedgerEvent::parse(&payload) {
                Ok(event) => self.apply_event(event),
                Err(e) => log::warn!("[STREAM] dropping message: {} (payload {:?})", e, payload),
            },
            ChannelSignal::Failed(reason) => self.drive_stream(StreamEvent::Failed(reason)),
        }
    }

    fn on_retry_timer(&mut self, retry_id: u64) {
        if retry_id != self.retry_id || !self.retry_timer.is_armed() {
            return;
        }
        self.retry_timer.cancel();
        self.drive_stream(StreamEvent::RetryDue);
    }

    fn on_poll_tick(&mut self, epoch: u64) {
        if epoch != self.epoch || !self.poll_timer.is_armed() {
            return;
        }
        self.trace("poll tick");
        self.spawn_fetch();
    }

    fn on_fetch_done(&mut self, epoch: u64, result: SyncResult<LedgerSnapshot>) {
        if epoch != self.epoch {
            self.trace(&format!("discarding fetch for old epoch {}", epoch));
            return;
        }

        match result {
            Ok(snapshot) => {
                if !snapshot.is_balanced() {
                    log::warn!(
                        "[FETCH] ledger totals disagree: available={} earned={} withdrawn={}",
                        snapshot.available,
                        snapshot.total_earned,
                        snapshot.total_withdrawn
                    );
                }
                self.snapshot = Some(snapshot);
                self.is_live = true;
                self.last_updated = Some(self.clock.now());
            }
            Err(e) if e.is_fetch_failure() => {
                self.is_live = false;
                log::warn!(
                    "[FETCH] snapshot fetch failed, keeping previous (as of {:?}): {}",
                    self.last_updated,
                    e
                );
            }
            Err(e) => {
                self.is_live = false;
                log::error!("[FETCH] snapshot fetch rejected: {}", e);
            }
        }
    }

    // ================================
    // Stream machine plumbing
    // ================================

    fn drive_stream(&mut self, event: StreamEvent) {
        self.trace(&format!("machine.handle_event({:?})", event));
        let cmds = self.machine.handle_event(event);
        for cmd in cmds {
            self.execute_command(cmd);
        }
    }

    fn execute_command(&mut self, cmd: StreamCommand) {
        self.trace(&format!("cmd: {:?}", cmd));
        match cmd {
            StreamCommand::OpenChannel => {
                let Some(address) = self.address.clone() else {
                    log::error!("[SYNC] open requested without an address");
                    return;
                };
                self.channel_id += 1;
                let handle = spawn_channel(
                    self.channels.clone(),
                    address,
                    self.channel_id,
                    self.signal_tx.clone(),
                );
                self.channel.replace(handle);
            }

            StreamCommand::CloseChannel => {
                self.channel.cancel();
                // Invalidate anything the closed channel already queued.
                self.channel_id += 1;
            }

            StreamCommand::ScheduleRetry { attempt, delay } => {
                self.debug(&format!("retry #{} in {:?}", attempt, delay));
                self.retry_id += 1;
                let retry_id = self.retry_id;
                let clock = self.clock.clone();
                let tx = self.retry_tx.clone();
                self.retry_timer.replace(tokio::spawn(async move {
                    clock.sleep(delay).await;
                    let _ = tx.send(retry_id);
                }));
            }

            StreamCommand::CancelRetry => {
                self.retry_timer.cancel();
                self.retry_id += 1;
            }

            StreamCommand::FallBackToPolling => {
                self.is_live = false;
                if !self.polling_enabled {
                    log::warn!("[SYNC] live stream lost and polling is disabled; data will go stale");
                }
            }
        }
    }

    // ================================
    // Polling + fetching
    // ================================

    fn sync_polling(&mut self) {
        let wanted = self.polling_enabled && self.address.is_some();

        if wanted && !self.poll_timer.is_armed() {
            let handle = self.scheduler.spawn(self.epoch, self.tick_tx.clone());
            self.poll_timer.replace(handle);
        } else if !wanted && self.poll_timer.is_armed() {
            self.debug("polling stopped");
            self.poll_timer.cancel();
        }
    }

    fn spawn_fetch(&mut self) {
        let Some(address) = self.address.clone() else {
            return;
        };
        let fetcher = self.fetcher.clone();
        let epoch = self.epoch;
        // Not serialized with other in-flight fetches: last response wins.
        self.fetches
            .spawn(async move { (epoch, fetcher.fetch_snapshot(&address).await) });
    }

    fn apply_event(&mut self, event: LedgerEvent) {
        self.debug(&format!("event {:?} {}", event.kind, event.amount));
        if self.reconciler.apply(&mut self.snapshot, event) != Applied::Ignored {
            self.is_live = true;
            self.last_updated = Some(self.clock.now());
        }
    }

    fn require_address(&self) -> SyncResult<&str> {
        self.address
            .as_deref()
            .ok_or_else(|| SyncError::Config("no wallet address available".into()))
    }

    /// Stops the stream, the poll timer and every in-flight fetch.
    fn teardown(&mut self) {
        self.drive_stream(StreamEvent::Stop);
        self.poll_timer.cancel();
        self.fetches.abort_all();
    }

    // ================================
    // Publishing
    // ================================

    fn view(&self) -> EarningsView {
        EarningsView {
            address: self.address.clone(),
            earnings: self.snapshot.clone(),
            is_loading: self.address.is_some()
                && self.snapshot.is_none()
                && !self.fetches.is_empty(),
            is_live: self.is_live,
            last_updated: self.last_updated,
            recent_events: self.reconciler.history().to_vec(),
            connection_status: self.machine.state(),
            connection_error: self.machine.last_error().map(str::to_string),
            polling_enabled: self.polling_enabled,
        }
    }

    fn publish(&self) {
        let next = self.view();
        self.view_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn t(&self) -> u128 {
        self.t0.elapsed().as_millis()
    }

    fn info(&self, msg: &str) {
        log::info!("[SYNC] {:>8}ms: {}", self.t(), msg);
    }

    fn debug(&self, msg: &str) {
        log::debug!("[SYNC] {:>8}ms: {}", self.t(), msg);
    }

    fn trace(&self, msg: &str) {
        log::trace!("[SYNC] {:>8}ms: {}", self.t(), msg);
    }
}
