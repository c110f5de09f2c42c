use std::collections::VecDeque;

use crate::ledger::types::LedgerEvent;

/// Bounded, newest-first buffer of applied events.
#[derive(Debug, Clone)]
pub struct EventHistory {
    events: VecDeque<LedgerEvent>,
    capacity: usize,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Puts `event` at index 0, evicting the oldest entry when full.
    pub fn push(&mut self, event: LedgerEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&LedgerEvent> {
        self.events.front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn to_vec(&self) -> Vec<LedgerEvent> {
        self.events.iter().cloned().collect()
    }
}
