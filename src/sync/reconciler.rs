use crate::ledger::types::{EventKind, LedgerEvent, LedgerSnapshot};
use crate::sync::history::EventHistory;

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Balances moved and the event was recorded.
    Updated,
    /// Recorded in history, but there is no snapshot to move yet.
    RecordedOnly,
    /// Unknown event type; nothing changed.
    Ignored,
}

/// Applies incremental ledger events to the held snapshot.
///
/// Arrival order is trusted as-is: there is no deduplication or
/// sequence check, so a replayed event is counted twice.
#[derive(Debug, Clone)]
pub struct EventReconciler {
    history: EventHistory,
}

impl EventReconciler {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: EventHistory::new(history_capacity),
        }
    }

    pub fn apply(&mut self, snapshot: &mut Option<LedgerSnapshot>, event: LedgerEvent) -> Applied {
        if event.kind == EventKind::Unknown {
            log::debug!("[RECONCILE] ignoring event of unknown type");
            return Applied::Ignored;
        }

        let outcome = match snapshot.as_mut() {
            Some(s) => {
                apply_delta(s, &event);
                Applied::Updated
            }
            None => {
                log::debug!("[RECONCILE] no snapshot yet, recording {:?} only", event.kind);
                Applied::RecordedOnly
            }
        };

        self.history.push(event);
        outcome
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Type-keyed delta rule.
pub fn apply_delta(snapshot: &mut LedgerSnapshot, event: &LedgerEvent) {
    match event.kind {
        kind if kind.is_credit() => {
            snapshot.available += event.amount;
            snapshot.total_earned += event.amount;
        }
        EventKind::Withdrawal => {
            snapshot.available -= event.amount;
            snapshot.total_withdrawn += event.amount;
        }
        _ => return,
    }
    snapshot.as_of = Some(event.timestamp);
}
