//! Bounded linear undo history.

use std::collections::VecDeque;

use log::debug;

use super::types::Snapshot;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Ordered snapshots plus a pointer to the current one
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    index: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record the state reached by a mutation. Anything after the current
    /// pointer is discarded; the oldest snapshot falls off past capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.index = self.snapshots.len() - 1;
        debug!("History: {} snapshot(s), at {}", self.snapshots.len(), self.index);
    }

    /// Step back one snapshot and return it
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.snapshots.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
