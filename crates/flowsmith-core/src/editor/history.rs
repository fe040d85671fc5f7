//! Bounded undo/redo history of step list snapshots.

use std::collections::HashMap;

use crate::models::{Step, StepId};

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Linear history of deep-copied step lists with a cursor.
///
/// The entry under the cursor always equals the buffer's current steps.
/// Recording after an undo discards the redo branch; recording past capacity
/// evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<Vec<Step>>,
    index: usize,
    capacity: usize,
}

impl HistoryStack {
    /// Creates a history holding one empty snapshot.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![Vec::new()],
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Drops all entries and starts over from `snapshot`.
    pub fn reset(&mut self, snapshot: Vec<Step>) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.index = 0;
    }

    /// Appends `snapshot` after the cursor and moves the cursor onto it.
    pub fn record(&mut self, snapshot: Vec<Step>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(0..excess);
        }
        self.index = self.entries.len() - 1;
    }

    /// Steps back one entry. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&[Step]> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    /// Steps forward one entry. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&[Step]> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Rewrites step ids in every snapshot.
    pub(crate) fn remap_ids(&mut self, ids: &HashMap<StepId, StepId>) {
        for step in self.entries.iter_mut().flatten() {
            if let Some(new_id) = ids.get(&step.id) {
                step.id = *new_id;
            }
        }
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
