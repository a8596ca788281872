use crate::grid::{MAX_CYCLES, SLOTS_PER_CYCLE};
use crate::state::history::History;
use crate::state::note::{NoteId, NoteKind, SequencerNote};

const HISTORY_LIMIT: usize = 100;

/// Hard end of the recordable region, in slots.
pub const MAX_SLOT: u32 = SLOTS_PER_CYCLE * MAX_CYCLES;

/// Owns the note set for one editing mode, together with its undo history.
///
/// Every mutation snapshots the pre-mutation state (subject to batching) so
/// undo is always one call away and never partial.
#[derive(Debug)]
pub struct NoteStore {
    notes: Vec<SequencerNote>,
    history: History,
    next_id: u64,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteStore {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            history: History::new(HISTORY_LIMIT),
            next_id: 1,
        }
    }

    pub fn notes(&self) -> &[SequencerNote] {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&SequencerNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn alloc_id(&mut self) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a note. Returns None without mutating when the timing pair is
    /// degenerate or out of the recordable region.
    pub fn create(&mut self, start_slot: u32, end_slot: u32, kind: NoteKind) -> Option<NoteId> {
        if end_slot <= start_slot || end_slot > MAX_SLOT {
            return None;
        }
        self.history.record(&self.notes);
        let id = self.alloc_id();
        let pos = self.notes.partition_point(|n| n.start_slot < start_slot);
        self.notes.insert(
            pos,
            SequencerNote {
                id,
                start_slot,
                end_slot,
                kind,
            },
        );
        Some(id)
    }

    /// Create several notes as one history entry. Used by paste and by
    /// copy-drag materialization. Invalid templates are skipped.
    pub fn create_many(&mut self, templates: &[(u32, u32, NoteKind)]) -> Vec<NoteId> {
        let valid: Vec<_> = templates
            .iter()
            .filter(|(s, e, _)| e > s && *e <= MAX_SLOT)
            .copied()
            .collect();
        if valid.is_empty() {
            return Vec::new();
        }
        self.history.record(&self.notes);
        let mut ids = Vec::with_capacity(valid.len());
        for (start_slot, end_slot, kind) in valid {
            let id = self.alloc_id();
            let pos = self.notes.partition_point(|n| n.start_slot < start_slot);
            self.notes.insert(
                pos,
                SequencerNote {
                    id,
                    start_slot,
                    end_slot,
                    kind,
                },
            );
            ids.push(id);
        }
        ids
    }

    /// Mutate one note in place. The edit is discarded if it would break the
    /// `end > start` invariant or leave the recordable region.
    pub fn update<F>(&mut self, id: NoteId, f: F) -> bool
    where
        F: FnOnce(&mut SequencerNote),
    {
        let Some(idx) = self.notes.iter().position(|n| n.id == id) else {
            return false;
        };
        let mut edited = self.notes[idx];
        f(&mut edited);
        edited.id = id; // ids are store-owned
        if edited.end_slot <= edited.start_slot || edited.end_slot > MAX_SLOT {
            return false;
        }
        self.history.record(&self.notes);
        self.notes[idx] = edited;
        // Keep start-slot ordering for the compiler and renderer
        self.notes.sort_by_key(|n| n.start_slot);
        true
    }

    pub fn remove(&mut self, id: NoteId) -> bool {
        if !self.notes.iter().any(|n| n.id == id) {
            return false;
        }
        self.history.record(&self.notes);
        self.notes.retain(|n| n.id != id);
        true
    }

    pub fn remove_many(&mut self, ids: &[NoteId]) -> usize {
        let count = self.notes.iter().filter(|n| ids.contains(&n.id)).count();
        if count == 0 {
            return 0;
        }
        self.history.record(&self.notes);
        self.notes.retain(|n| !ids.contains(&n.id));
        count
    }

    pub fn clear(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        self.history.record(&self.notes);
        self.notes.clear();
    }

    /// Replace the whole set as one history entry. Used by quantize-all.
    pub fn replace_all(&mut self, mut notes: Vec<SequencerNote>) {
        self.history.record(&self.notes);
        notes.sort_by_key(|n| n.start_slot);
        self.notes = notes;
    }

    pub fn start_batch(&mut self) {
        self.history.start_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    pub fn batch_open(&self) -> bool {
        self.history.batch_open()
    }

    pub fn undo(&mut self) -> bool {
        if let Some(snapshot) = self.history.undo(&self.notes) {
            self.notes = snapshot;
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if let Some(snapshot) = self.history.redo(&self.notes) {
            self.notes = snapshot;
            true
        } else {
            false
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
