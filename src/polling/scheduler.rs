use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clock::Clock;

/// Periodic full-resync ticker.
///
/// Ticks once immediately, then every `interval`, independent of the stream
/// connector. Each tick carries the address epoch it was started for so the
/// receiver can drop ticks that outlived their address.
pub struct PollScheduler {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl PollScheduler {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { interval, clock }
    }

    /// Starts ticking into `ticks`. Aborting the returned handle stops it.
    pub fn spawn(&self, epoch: u64, ticks: mpsc::UnboundedSender<u64>) -> JoinHandle<()> {
        let clock = self.clock.clone();
        let interval = self.interval;

        log::debug!("[POLL] started, every {:?}", interval);
        tokio::spawn(async move {
            loop {
                if ticks.send(epoch).is_err() {
                    log::trace!("[POLL] receiver gone, stopping");
                    break;
                }
                clock.sleep(interval).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RecordingClock;

    #[tokio::test(start_paused = true)]
    async fn ticks_immediately_then_on_interval() {
        let clock = RecordingClock::new();
        let scheduler = PollScheduler::new(Duration::from_secs(10), Arc::new(clock.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let start = tokio::time::Instant::now();
        let handle = scheduler.spawn(7, tx);

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(start.elapsed(), Duration::from_secs(10));

        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(start.elapsed(), Duration::from_secs(20));

        handle.abort();
        assert!(clock.sleeps().iter().all(|d| *d == Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_ticks() {
        let scheduler = PollScheduler::new(Duration::from_secs(1), Arc::new(RecordingClock::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = scheduler.spawn(1, tx);
        assert_eq!(rx.recv().await, Some(1));
        handle.abort();

        // Sender is dropped with the aborted task
        assert_eq!(rx.recv().await, None);
    }
}
