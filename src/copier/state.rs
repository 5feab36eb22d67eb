//! Orchestrator-private progress bookkeeping, keyed by record index.
//!
//! Invariant: `copied`, `errors` and `started` never overlap. `copied` and `errors` only grow;
//! an index leaves `started` exactly once (into `copied`, into `errors`, or back to the queue).

use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct ProgressState {
    total: usize,
    first_index: usize,
    copied: BTreeSet<usize>,
    errors: BTreeSet<usize>,
    started: BTreeSet<usize>,
    watermark: usize,
}

impl ProgressState {
    /// Track `total` records whose indexes start at `first_index`.
    pub fn new(first_index: usize, total: usize) -> Self {
        Self {
            total,
            first_index,
            watermark: first_index,
            ..Self::default()
        }
    }

    /// Count indexes as copied without a worker (asserted present on the volume).
    pub fn mark_present<I: IntoIterator<Item = usize>>(&mut self, indexes: I) {
        for index in indexes {
            self.started.remove(&index);
            if !self.errors.contains(&index) {
                self.copied.insert(index);
            }
        }
        self.advance_watermark();
    }

    /// A worker checked `index` out. Ignored (returns false) if its outcome already arrived.
    pub fn record_started(&mut self, index: usize) -> bool {
        if self.copied.contains(&index) || self.errors.contains(&index) {
            return false;
        }
        self.started.insert(index)
    }

    pub fn record_completed(&mut self, index: usize) -> bool {
        self.started.remove(&index);
        if self.errors.contains(&index) {
            return false;
        }
        let inserted = self.copied.insert(index);
        self.advance_watermark();
        inserted
    }

    pub fn record_error(&mut self, index: usize) -> bool {
        self.started.remove(&index);
        if self.copied.contains(&index) {
            return false;
        }
        let inserted = self.errors.insert(index);
        self.advance_watermark();
        inserted
    }

    /// Empty the in-flight set, ascending.
    pub fn take_started(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.started).into_iter().collect()
    }

    fn advance_watermark(&mut self) {
        while self.copied.contains(&self.watermark) || self.errors.contains(&self.watermark) {
            self.watermark += 1;
        }
    }

    /// Lowest index not yet copied or failed (end of the contiguous processed prefix).
    pub fn next_unprocessed(&self) -> usize {
        self.watermark
    }

    pub fn first_index(&self) -> usize {
        self.first_index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.copied.len() + self.errors.len()
    }

    pub fn is_finished(&self) -> bool {
        self.processed() == self.total
    }

    pub fn copied(&self) -> &BTreeSet<usize> {
        &self.copied
    }

    pub fn errors(&self) -> &BTreeSet<usize> {
        &self.errors
    }

    pub fn started(&self) -> &BTreeSet<usize> {
        &self.started
    }
}
