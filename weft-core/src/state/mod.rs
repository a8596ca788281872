pub mod clipboard;
pub mod history;
pub mod note;
pub mod store;
pub mod view;

pub use clipboard::{Clipboard, ClipboardNote, Selection};
pub use note::{DrumVoice, NoteId, NoteKind, SequencerNote, MAX_PITCH};
pub use store::{NoteStore, MAX_SLOT};
pub use view::ViewState;

use crate::grid::{self, Subdivision, MAX_CYCLES, SLOTS_PER_CYCLE};
use crate::notation;

/// Which grid the user is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Melodic,
    Percussive,
}

/// Store and view for one mode. Mode switches never touch the other mode's
/// state, so both sets survive for the whole session.
#[derive(Debug)]
pub struct ModeState {
    pub store: NoteStore,
    pub view: ViewState,
}

/// Top-level sequencer state, owned for the session and mutated only through
/// the interaction engines and dispatched actions.
pub struct SequencerState {
    pub mode: EditMode,
    melodic: ModeState,
    percussive: ModeState,
    pub selection: Selection,
    pub clipboard: Clipboard,
    pub quantize: Subdivision,
    /// Paste cursor position in slots, moved by arrow keys one step at a time.
    pub paste_cursor: u32,
    /// Configured pattern length in cycles (1..=MAX_CYCLES).
    pub pattern_cycles: u32,
    pub playing: bool,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencerState {
    pub fn new() -> Self {
        Self {
            mode: EditMode::Melodic,
            melodic: ModeState {
                store: NoteStore::new(),
                view: ViewState::melodic(),
            },
            percussive: ModeState {
                store: NoteStore::new(),
                view: ViewState::percussive(DrumVoice::ALL.len()),
            },
            selection: Selection::default(),
            clipboard: Clipboard::default(),
            quantize: Subdivision::default(),
            paste_cursor: 0,
            pattern_cycles: 1,
            playing: false,
        }
    }

    pub fn mode_state(&self) -> &ModeState {
        match self.mode {
            EditMode::Melodic => &self.melodic,
            EditMode::Percussive => &self.percussive,
        }
    }

    pub fn mode_state_mut(&mut self) -> &mut ModeState {
        match self.mode {
            EditMode::Melodic => &mut self.melodic,
            EditMode::Percussive => &mut self.percussive,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.mode_state().store
    }

    pub fn store_mut(&mut self) -> &mut NoteStore {
        &mut self.mode_state_mut().store
    }

    pub fn view(&self) -> &ViewState {
        &self.mode_state().view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.mode_state_mut().view
    }

    /// Drop selection entries whose notes are gone from the current store
    /// (after undo/redo or a removal).
    pub fn prune_selection(&mut self) {
        let store = match self.mode {
            EditMode::Melodic => &self.melodic.store,
            EditMode::Percussive => &self.percussive.store,
        };
        self.selection.retain_existing(store.notes());
    }

    /// The note kind a given grid row produces in the current mode, or None
    /// when the row is outside the valid domain. This is the validity gate:
    /// an out-of-range row never becomes a note.
    pub fn kind_for_row(&self, row: i64) -> Option<NoteKind> {
        match self.mode {
            EditMode::Melodic => {
                if (0..=MAX_PITCH as i64).contains(&row) {
                    Some(NoteKind::Melodic { pitch: row as u8 })
                } else {
                    None
                }
            }
            EditMode::Percussive => {
                if row >= 0 {
                    DrumVoice::from_row(row as usize).map(|voice| NoteKind::Percussive { voice })
                } else {
                    None
                }
            }
        }
    }

    /// Switch editing modes. Both note sets survive; the selection and both
    /// histories are cleared because undo is mode-scoped.
    pub fn switch_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.selection.clear();
        self.melodic.store.end_batch();
        self.percussive.store.end_batch();
        self.melodic.store.clear_history();
        self.percussive.store.clear_history();
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            EditMode::Melodic => EditMode::Percussive,
            EditMode::Percussive => EditMode::Melodic,
        };
        self.switch_mode(next);
    }

    /// Delete the current selection as its own undo step: any open gesture
    /// batch is closed first.
    pub fn delete_selection(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let ids: Vec<NoteId> = self.selection.ids().collect();
        let store = self.store_mut();
        store.end_batch();
        let removed = store.remove_many(&ids);
        self.selection.clear();
        removed
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn copy_selection(&mut self) {
        let selected: Vec<SequencerNote> = self
            .store()
            .notes()
            .iter()
            .filter(|n| self.selection.contains(n.id))
            .copied()
            .collect();
        self.clipboard.copy_from(&selected);
    }

    pub fn cut_selection(&mut self) -> usize {
        self.copy_selection();
        self.delete_selection()
    }

    /// Paste clipboard contents at the paste cursor and select the new notes.
    pub fn paste(&mut self) -> usize {
        if self.clipboard.is_empty() {
            return 0;
        }
        let templates = self.clipboard.paste_at(self.paste_cursor);
        let ids = self.store_mut().create_many(&templates);
        if !ids.is_empty() {
            self.selection.clear();
            for id in &ids {
                self.selection.insert(*id);
            }
        }
        ids.len()
    }

    /// Move the paste cursor by `delta` quantize steps, clamped to the
    /// recordable region.
    pub fn move_paste_cursor(&mut self, delta: i32) {
        let step = self.quantize.slot_span() as i64;
        let next = self.paste_cursor as i64 + delta as i64 * step;
        self.paste_cursor = next.clamp(0, (MAX_SLOT - self.quantize.slot_span()) as i64) as u32;
    }

    pub fn cycle_quantize(&mut self) {
        self.quantize = self.quantize.next();
        self.paste_cursor = grid::snap_floor(self.paste_cursor, self.quantize);
    }

    pub fn set_pattern_cycles(&mut self, cycles: u32) {
        self.pattern_cycles = cycles.clamp(1, MAX_CYCLES);
    }

    /// Number of cycles the current mode's notes actually span, bounded by
    /// the configured pattern length.
    pub fn used_cycles(&self) -> u32 {
        let last_end = self
            .store()
            .notes()
            .iter()
            .map(|n| n.end_slot)
            .max()
            .unwrap_or(0);
        let spanned = last_end.div_ceil(SLOTS_PER_CYCLE).max(1);
        spanned.min(self.pattern_cycles.max(1)).max(1)
    }

    /// Quantize every note in the current mode as one undo step.
    pub fn quantize_all(&mut self) {
        if self.store().is_empty() {
            return;
        }
        let quantize = self.quantize;
        let mut notes = self.store().notes().to_vec();
        grid::quantize_notes(&mut notes, quantize);
        self.store_mut().replace_all(notes);
    }

    /// Compile the current mode's notes to wrapped pattern notation. This is
    /// the explicit store -> quantizer -> compiler path; the stored notes are
    /// not modified.
    pub fn compile(&self) -> String {
        let mut notes = self.store().notes().to_vec();
        grid::quantize_notes(&mut notes, self.quantize);
        notation::compile(&notes, self.mode, self.quantize, self.pattern_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_switch_preserves_both_note_sets() {
        let mut state = SequencerState::new();
        state.store_mut().create(0, 12, NoteKind::Melodic { pitch: 60 });
        state.switch_mode(EditMode::Percussive);
        state.store_mut().create(
            0,
            12,
            NoteKind::Percussive {
                voice: DrumVoice::Kick,
            },
        );
        assert_eq!(state.store().notes().len(), 1);
        state.switch_mode(EditMode::Melodic);
        assert_eq!(state.store().notes().len(), 1);
        assert!(matches!(
            state.store().notes()[0].kind,
            NoteKind::Melodic { pitch: 60 }
        ));
    }

    #[test]
    fn mode_switch_clears_history_and_selection() {
        let mut state = SequencerState::new();
        let id = state
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 60 })
            .unwrap();
        state.selection.insert(id);
        assert!(state.store().can_undo());
        state.switch_mode(EditMode::Percussive);
        state.switch_mode(EditMode::Melodic);
        assert!(!state.store().can_undo());
        assert!(state.selection.is_empty());
    }

    #[test]
    fn kind_for_row_rejects_out_of_range() {
        let mut state = SequencerState::new();
        assert!(state.kind_for_row(128).is_none());
        assert!(state.kind_for_row(-1).is_none());
        assert!(state.kind_for_row(127).is_some());
        state.switch_mode(EditMode::Percussive);
        assert!(state.kind_for_row(DrumVoice::ALL.len() as i64).is_none());
        assert_eq!(
            state.kind_for_row(0),
            Some(NoteKind::Percussive {
                voice: DrumVoice::Kick
            })
        );
    }

    #[test]
    fn copy_paste_at_cursor() {
        let mut state = SequencerState::new();
        let a = state
            .store_mut()
            .create(24, 36, NoteKind::Melodic { pitch: 60 })
            .unwrap();
        let b = state
            .store_mut()
            .create(48, 72, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        state.selection.insert(a);
        state.selection.insert(b);
        state.copy_selection();
        state.paste_cursor = 96;
        assert_eq!(state.paste(), 2);
        let starts: Vec<u32> = state.store().notes().iter().map(|n| n.start_slot).collect();
        assert!(starts.contains(&96));
        assert!(starts.contains(&120));
        // Pasted notes become the selection
        assert_eq!(state.selection.len(), 2);
    }

    #[test]
    fn delete_selection_is_single_undo_step_even_mid_batch() {
        let mut state = SequencerState::new();
        let id = state
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 60 })
            .unwrap();
        state.selection.insert(id);
        state.store_mut().start_batch();
        assert_eq!(state.delete_selection(), 1);
        assert!(!state.store().batch_open());
        assert!(state.store_mut().undo());
        assert_eq!(state.store().notes().len(), 1);
    }

    #[test]
    fn paste_cursor_moves_by_quantize_step() {
        let mut state = SequencerState::new();
        state.quantize = Subdivision::Eighth;
        state.move_paste_cursor(2);
        assert_eq!(state.paste_cursor, 24);
        state.move_paste_cursor(-5);
        assert_eq!(state.paste_cursor, 0);
    }

    #[test]
    fn add_then_remove_compiles_back_to_empty() {
        let mut state = SequencerState::new();
        assert_eq!(state.compile(), "");
        let id = state
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 60 })
            .unwrap();
        state.store_mut().remove(id);
        assert_eq!(state.compile(), "");
    }

    #[test]
    fn used_cycles_bounded_by_configured_length() {
        let mut state = SequencerState::new();
        state.set_pattern_cycles(2);
        state
            .store_mut()
            .create(0, SLOTS_PER_CYCLE * 4, NoteKind::Melodic { pitch: 60 });
        assert_eq!(state.used_cycles(), 2);
        assert_eq!(SequencerState::new().used_cycles(), 1);
    }
}
