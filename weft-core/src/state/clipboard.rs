use std::collections::HashSet;

use crate::state::note::{NoteId, NoteKind, SequencerNote};

/// A note template stored with its position relative to the earliest selected
/// note, so paste lands wherever the paste cursor sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardNote {
    pub slot_offset: u32, // start_slot - anchor slot
    pub duration: u32,
    pub kind: NoteKind,
}

/// Clipboard of id-less note templates, normalized so the earliest starts at
/// offset 0.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    notes: Vec<ClipboardNote>,
}

impl Clipboard {
    pub fn copy_from(&mut self, notes: &[SequencerNote]) {
        let Some(anchor) = notes.iter().map(|n| n.start_slot).min() else {
            return; // copying nothing leaves previous contents alone
        };
        self.notes = notes
            .iter()
            .map(|n| ClipboardNote {
                slot_offset: n.start_slot - anchor,
                duration: n.duration_slots(),
                kind: n.kind,
            })
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Materialize templates at an anchor slot as (start, end, kind) tuples.
    pub fn paste_at(&self, anchor_slot: u32) -> Vec<(u32, u32, NoteKind)> {
        self.notes
            .iter()
            .map(|cn| {
                let start = anchor_slot + cn.slot_offset;
                (start, start + cn.duration, cn.kind)
            })
            .collect()
    }
}

/// The set of selected note ids.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<NoteId>,
}

impl Selection {
    pub fn contains(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.ids.iter().copied()
    }

    pub fn set_only(&mut self, id: NoteId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    pub fn toggle(&mut self, id: NoteId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn insert(&mut self, id: NoteId) {
        self.ids.insert(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer resolve to a live note.
    pub fn retain_existing(&mut self, notes: &[SequencerNote]) {
        self.ids.retain(|id| notes.iter().any(|n| n.id == *id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: u64, start: u32, end: u32, pitch: u8) -> SequencerNote {
        SequencerNote {
            id: NoteId(id),
            start_slot: start,
            end_slot: end,
            kind: NoteKind::Melodic { pitch },
        }
    }

    #[test]
    fn copy_normalizes_to_slot_zero() {
        let mut clip = Clipboard::default();
        clip.copy_from(&[note(1, 24, 36, 60), note(2, 48, 96, 64)]);
        let pasted = clip.paste_at(0);
        assert_eq!(pasted[0], (0, 12, NoteKind::Melodic { pitch: 60 }));
        assert_eq!(pasted[1], (24, 72, NoteKind::Melodic { pitch: 64 }));
    }

    #[test]
    fn paste_at_cursor_offsets_everything() {
        let mut clip = Clipboard::default();
        clip.copy_from(&[note(1, 0, 12, 60)]);
        assert_eq!(clip.paste_at(48), vec![(48, 60, NoteKind::Melodic { pitch: 60 })]);
    }

    #[test]
    fn copying_empty_selection_keeps_contents() {
        let mut clip = Clipboard::default();
        clip.copy_from(&[note(1, 0, 12, 60)]);
        clip.copy_from(&[]);
        assert!(!clip.is_empty());
    }

    #[test]
    fn selection_toggle() {
        let mut sel = Selection::default();
        sel.toggle(NoteId(1));
        assert!(sel.contains(NoteId(1)));
        sel.toggle(NoteId(1));
        assert!(sel.is_empty());
    }

    #[test]
    fn retain_existing_drops_dead_ids() {
        let mut sel = Selection::default();
        sel.insert(NoteId(1));
        sel.insert(NoteId(2));
        sel.retain_existing(&[note(2, 0, 12, 60)]);
        assert!(!sel.contains(NoteId(1)));
        assert!(sel.contains(NoteId(2)));
    }
}
