//! Bounded undo/redo history of dataset snapshots

use crate::dataset::Dataset;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Default number of snapshots kept before the oldest is evicted
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Description given to the snapshot seeded on load
pub const INITIAL_LOAD: &str = "Initial load";

/// An immutable copy of the dataset at one point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    data: Dataset,
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl Snapshot {
    fn new(data: Dataset, version: u64, description: impl Into<String>) -> Self {
        Self {
            data,
            version,
            timestamp: Utc::now(),
            description: description.into(),
        }
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }
}

/// Linear snapshot stack with a current pointer.
///
/// Pushing discards everything after the pointer; there is no branching redo.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<Snapshot>,
    current: usize,
    max_entries: usize,
    version_counter: u64,
    last_action: Option<String>,
    dirty: bool,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current: 0,
            max_entries: max_entries.max(1),
            version_counter: 0,
            last_action: None,
            dirty: false,
        }
    }

    /// Reset to a single "Initial load" snapshot of `dataset`
    pub fn seed(&mut self, dataset: &Dataset) {
        self.entries.clear();
        self.entries
            .push_back(Snapshot::new(dataset.clone(), 1, INITIAL_LOAD));
        self.current = 0;
        self.version_counter = 1;
        self.last_action = None;
        self.dirty = false;
    }

    /// Record a copy of `dataset` as the newest state
    pub fn push_snapshot(&mut self, dataset: &Dataset, description: impl Into<String>) {
        let description = description.into();
        self.version_counter += 1;

        if !self.entries.is_empty() {
            self.entries.truncate(self.current + 1);
        }
        self.entries
            .push_back(Snapshot::new(dataset.clone(), self.version_counter, description.clone()));

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }

        self.current = self.entries.len() - 1;
        self.dirty = true;
        log::debug!(
            "History push #{} '{}' ({} entries)",
            self.version_counter,
            description,
            self.entries.len()
        );
        self.last_action = Some(description);
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.current < self.entries.len() - 1
    }

    /// Step back one snapshot, returning a copy of the state to restore
    pub fn undo(&mut self) -> Option<Dataset> {
        if !self.can_undo() {
            return None;
        }
        let undone = self.entries[self.current].description.clone();
        self.current -= 1;
        self.last_action = Some(format!("Undo: {}", undone));
        self.dirty = true;
        Some(self.entries[self.current].data.clone())
    }

    /// Step forward one snapshot, returning a copy of the state to restore
    pub fn redo(&mut self) -> Option<Dataset> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        let snapshot = &self.entries[self.current];
        self.last_action = Some(format!("Redo: {}", snapshot.description));
        self.dirty = true;
        Some(snapshot.data.clone())
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.current)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.current
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn last_action(&self) -> Option<&str> {
        self.last_action.as_deref()
    }

    /// Whether the live state has changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
