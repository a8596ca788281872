use crate::state::note::SequencerNote;

/// Bounded undo/redo history of full note-set snapshots.
///
/// A snapshot is recorded immediately before a mutation, never after. While a
/// batch is open only the first mutation records, so a drag of N move events
/// collapses into a single undo step.
#[derive(Debug, Default)]
pub struct History {
    past: Vec<Vec<SequencerNote>>,
    future: Vec<Vec<SequencerNote>>,
    batch_open: bool,
    batch_recorded: bool,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            batch_open: false,
            batch_recorded: false,
            limit,
        }
    }

    /// Record the pre-mutation state. Clears the redo stack.
    pub fn record(&mut self, snapshot: &[SequencerNote]) {
        if self.batch_open {
            if self.batch_recorded {
                return;
            }
            self.batch_recorded = true;
        }
        self.future.clear();
        self.past.push(snapshot.to_vec());
        if self.past.len() > self.limit {
            self.past.remove(0);
        }
    }

    pub fn start_batch(&mut self) {
        self.batch_open = true;
        self.batch_recorded = false;
    }

    pub fn end_batch(&mut self) {
        self.batch_open = false;
        self.batch_recorded = false;
    }

    pub fn batch_open(&self) -> bool {
        self.batch_open
    }

    /// Swap the current state for the newest past snapshot. Returns the
    /// snapshot to restore, or None when there is nothing to undo.
    pub fn undo(&mut self, current: &[SequencerNote]) -> Option<Vec<SequencerNote>> {
        let snapshot = self.past.pop()?;
        self.future.push(current.to_vec());
        Some(snapshot)
    }

    pub fn redo(&mut self, current: &[SequencerNote]) -> Option<Vec<SequencerNote>> {
        let snapshot = self.future.pop()?;
        self.past.push(current.to_vec());
        Some(snapshot)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch_open = false;
        self.batch_recorded = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}
