use crate::coords::{self, CanvasSize, HitEdge, PxRect, POINTER_EDGE_MARGIN};
use crate::grid::{self, Subdivision};
use crate::input::Modifiers;
use crate::state::note::{DrumVoice, NoteKind, SequencerNote, MAX_PITCH};
use crate::state::store::MAX_SLOT;
use crate::state::{EditMode, SequencerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    ResizeLeft,
    ResizeRight,
}

/// An in-flight drag. `originals` is the participating note set as it was at
/// press time; plain drags mutate the store every move inside one batch,
/// copy drags only compute ghosts until release.
#[derive(Debug, Clone)]
struct Drag {
    kind: DragKind,
    copy: bool,
    originals: Vec<SequencerNote>,
    grab_slot: f64,
    grab_row: i64,
    ghosts: Vec<(u32, u32, NoteKind)>,
}

#[derive(Debug, Clone)]
enum PointerState {
    Idle,
    Drawing { anchor_slot: u32 },
    Dragging(Drag),
    BoxSelect { origin: (f32, f32), current: (f32, f32) },
}

/// Pointer (mouse/pen) interaction state machine:
/// idle -> drawing | dragging | box-select -> idle.
pub struct PointerEngine {
    canvas: CanvasSize,
    state: PointerState,
    /// Id of the note being drawn, while in Drawing.
    drawing_id: Option<crate::state::NoteId>,
}

impl PointerEngine {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            state: PointerState::Idle,
            drawing_id: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, PointerState::Idle)
    }

    /// Copy-drag ghost set for the renderer. Empty outside a copy drag.
    pub fn ghosts(&self) -> &[(u32, u32, NoteKind)] {
        match &self.state {
            PointerState::Dragging(drag) if drag.copy => &drag.ghosts,
            _ => &[],
        }
    }

    /// Box-select rectangle for the renderer, while one is open.
    pub fn box_rect(&self) -> Option<PxRect> {
        match self.state {
            PointerState::BoxSelect { origin, current } => {
                Some(PxRect::from_corners(origin, current))
            }
            _ => None,
        }
    }

    pub fn pointer_down(&mut self, seq: &mut SequencerState, x: f32, y: f32, mods: Modifiers) {
        let view = *seq.view();
        let hit = coords::hit_test(seq.store().notes(), &view, self.canvas, x, y, |_| {
            POINTER_EDGE_MARGIN
        });

        match hit {
            Some((id, edge)) => {
                if mods.additive() {
                    // Toggle membership without starting a drag
                    seq.selection.toggle(id);
                    return;
                }
                let group = if edge == HitEdge::Body && seq.selection.contains(id) {
                    // Group drag of the whole selection
                    seq.store()
                        .notes()
                        .iter()
                        .filter(|n| seq.selection.contains(n.id))
                        .copied()
                        .collect()
                } else {
                    let Some(note) = seq.store().note(id).copied() else {
                        return;
                    };
                    seq.selection.set_only(id);
                    vec![note]
                };
                let kind = match edge {
                    HitEdge::Body => DragKind::Move,
                    HitEdge::Left => DragKind::ResizeLeft,
                    HitEdge::Right => DragKind::ResizeRight,
                };
                let copy = mods.copy() && kind == DragKind::Move;
                if !copy {
                    seq.store_mut().start_batch();
                }
                self.state = PointerState::Dragging(Drag {
                    kind,
                    copy,
                    originals: group,
                    grab_slot: coords::slot_at_x(&view, self.canvas, x),
                    grab_row: coords::row_at_y(&view, self.canvas, y),
                    ghosts: Vec::new(),
                });
            }
            None => {
                if mods.additive() {
                    self.state = PointerState::BoxSelect {
                        origin: (x, y),
                        current: (x, y),
                    };
                    return;
                }
                self.begin_draw(seq, x, y);
            }
        }
    }

    fn begin_draw(&mut self, seq: &mut SequencerState, x: f32, y: f32) {
        let view = *seq.view();
        let slot = coords::slot_at_x(&view, self.canvas, x).max(0.0) as u32;
        let row = coords::row_at_y(&view, self.canvas, y);
        let Some(kind) = seq.kind_for_row(row) else {
            return; // out-of-range row: no note, no state change
        };
        let quantize = seq.quantize;
        let start = grid::snap_floor(slot.min(MAX_SLOT - 1), quantize);
        let end = start + quantize.slot_span();
        seq.store_mut().start_batch();
        if let Some(id) = seq.store_mut().create(start, end, kind) {
            seq.selection.set_only(id);
            self.drawing_id = Some(id);
            self.state = PointerState::Drawing { anchor_slot: start };
        } else {
            seq.store_mut().end_batch();
        }
    }

    pub fn pointer_move(&mut self, seq: &mut SequencerState, x: f32, y: f32) {
        let view = *seq.view();
        match &mut self.state {
            PointerState::Idle => {}
            PointerState::Drawing { anchor_slot } => {
                let anchor = *anchor_slot;
                let quantize = seq.quantize;
                let slot = coords::slot_at_x(&view, self.canvas, x).max(0.0) as u32;
                let end = grid::snap_round(slot, quantize)
                    .clamp(anchor + quantize.slot_span(), MAX_SLOT);
                if let Some(id) = self.drawing_id {
                    seq.store_mut().update(id, |n| n.end_slot = end);
                }
            }
            PointerState::Dragging(drag) => {
                let cur_slot = coords::slot_at_x(&view, self.canvas, x);
                let cur_row = coords::row_at_y(&view, self.canvas, y);
                let delta = drag_delta(
                    seq.mode,
                    seq.quantize,
                    &drag.originals,
                    drag.kind,
                    cur_slot - drag.grab_slot,
                    cur_row - drag.grab_row,
                );
                if drag.copy {
                    drag.ghosts = drag
                        .originals
                        .iter()
                        .map(|n| apply_delta(n, drag.kind, delta))
                        .collect();
                } else {
                    let edits: Vec<(crate::state::NoteId, (u32, u32, NoteKind))> = drag
                        .originals
                        .iter()
                        .map(|n| (n.id, apply_delta(n, drag.kind, delta)))
                        .collect();
                    for (id, (start, end, kind)) in edits {
                        seq.store_mut().update(id, |n| {
                            n.start_slot = start;
                            n.end_slot = end;
                            n.kind = kind;
                        });
                    }
                }
            }
            PointerState::BoxSelect { current, .. } => {
                *current = (x, y);
            }
        }
    }

    pub fn pointer_up(&mut self, seq: &mut SequencerState) {
        match std::mem::replace(&mut self.state, PointerState::Idle) {
            PointerState::Idle => {}
            PointerState::Drawing { .. } => {
                seq.store_mut().end_batch();
                self.drawing_id = None;
            }
            PointerState::Dragging(drag) => {
                if drag.copy {
                    // Ghosts materialize only now, as one history entry
                    let ids = seq.store_mut().create_many(&drag.ghosts);
                    if !ids.is_empty() {
                        seq.selection.clear();
                        for id in ids {
                            seq.selection.insert(id);
                        }
                    }
                } else {
                    seq.store_mut().end_batch();
                }
            }
            PointerState::BoxSelect { origin, current } => {
                let rect = PxRect::from_corners(origin, current);
                let view = *seq.view();
                let hits: Vec<crate::state::NoteId> = seq
                    .store()
                    .notes()
                    .iter()
                    .filter(|n| coords::note_rect(&view, self.canvas, n).intersects(&rect))
                    .map(|n| n.id)
                    .collect();
                // Additive: the modifier was held to get here
                for id in hits {
                    seq.selection.insert(id);
                }
            }
        }
    }

    /// Abort any in-flight gesture without materializing ghosts.
    pub fn cancel(&mut self, seq: &mut SequencerState) {
        if !matches!(self.state, PointerState::Idle) {
            seq.store_mut().end_batch();
        }
        self.state = PointerState::Idle;
        self.drawing_id = None;
    }
}

/// Clamp a raw (slot, row) displacement so every note in the group stays
/// inside the recordable region and the row domain, then snap the slot part
/// to whole quantize steps.
pub(crate) fn drag_delta(
    mode: EditMode,
    quantize: Subdivision,
    group: &[SequencerNote],
    kind: DragKind,
    raw_slots: f64,
    raw_rows: i64,
) -> (i64, i64) {
    let span = quantize.slot_span() as i64;
    let mut dslots = (raw_slots / span as f64).round() as i64 * span;

    let min_start = group.iter().map(|n| n.start_slot).min().unwrap_or(0) as i64;
    let max_end = group.iter().map(|n| n.end_slot).max().unwrap_or(0) as i64;
    match kind {
        DragKind::Move => {
            dslots = dslots.clamp(-min_start, MAX_SLOT as i64 - max_end);
        }
        // Resizes act on a single note; keep at least one step of duration
        // and stay inside the recordable region.
        DragKind::ResizeLeft => {
            dslots = dslots.clamp(-min_start, (max_end - min_start) - span);
        }
        DragKind::ResizeRight => {
            dslots = dslots.clamp(span - (max_end - min_start), MAX_SLOT as i64 - max_end);
        }
    }

    let mut drows = if kind == DragKind::Move { raw_rows } else { 0 };
    let row_max = match mode {
        EditMode::Melodic => MAX_PITCH as i64,
        EditMode::Percussive => DrumVoice::ALL.len() as i64 - 1,
    };
    let group_min_row = group.iter().map(|n| n.kind.row() as i64).min().unwrap_or(0);
    let group_max_row = group.iter().map(|n| n.kind.row() as i64).max().unwrap_or(0);
    drows = drows.clamp(-group_min_row, row_max - group_max_row);

    (dslots, drows)
}

/// Apply a clamped displacement to one note, producing a valid template.
pub(crate) fn apply_delta(
    note: &SequencerNote,
    kind: DragKind,
    (dslots, drows): (i64, i64),
) -> (u32, u32, NoteKind) {
    let shifted_kind = match note.kind {
        NoteKind::Melodic { pitch } => NoteKind::Melodic {
            pitch: (pitch as i64 + drows) as u8,
        },
        NoteKind::Percussive { voice } => NoteKind::Percussive {
            voice: DrumVoice::from_row((voice.row() as i64 + drows) as usize)
                .unwrap_or(voice),
        },
    };
    match kind {
        DragKind::Move => (
            (note.start_slot as i64 + dslots) as u32,
            (note.end_slot as i64 + dslots) as u32,
            shifted_kind,
        ),
        DragKind::ResizeLeft => {
            let start = (note.start_slot as i64 + dslots)
                .clamp(0, note.end_slot as i64 - 1) as u32;
            (start, note.end_slot, note.kind)
        }
        DragKind::ResizeRight => {
            let end = (note.end_slot as i64 + dslots)
                .clamp(note.start_slot as i64 + 1, MAX_SLOT as i64) as u32;
            (note.start_slot, end, note.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NoteId;

    fn engine() -> PointerEngine {
        PointerEngine::new(CanvasSize::default())
    }

    fn seq() -> SequencerState {
        let mut s = SequencerState::new();
        // A predictable window: one cycle wide, rows 60..72 visible
        let v = s.view_mut();
        v.start_slot = 0.0;
        v.span_slots = 96.0;
        v.bottom_row = 60.0;
        v.visible_rows = 12.0;
        s
    }

    /// Canvas x for a slot and y for a row center under the test view.
    fn at(seq: &SequencerState, slot: f64, row: i64) -> (f32, f32) {
        let c = CanvasSize::default();
        let x = coords::x_at_slot(seq.view(), c, slot);
        let y = coords::y_at_row_top(seq.view(), c, row) + coords::row_height(seq.view(), c) / 2.0;
        (x, y)
    }

    #[test]
    fn press_on_empty_draws_quantized_note() {
        let mut e = engine();
        let mut s = seq();
        let (x, y) = at(&s, 15.0, 64); // mid-step press
        e.pointer_down(&mut s, x, y, Modifiers::default());
        e.pointer_up(&mut s);
        let notes = s.store().notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].start_slot, 12); // floor-snapped on the 1/8 grid
        assert_eq!(notes[0].end_slot, 24);
        assert_eq!(notes[0].kind, NoteKind::Melodic { pitch: 64 });
        assert!(s.selection.contains(notes[0].id));
    }

    #[test]
    fn drawing_extends_end_while_moving() {
        let mut e = engine();
        let mut s = seq();
        let (x, y) = at(&s, 0.0, 64);
        e.pointer_down(&mut s, x, y, Modifiers::default());
        let (x2, _) = at(&s, 46.0, 64);
        e.pointer_move(&mut s, x2, y);
        e.pointer_up(&mut s);
        assert_eq!(s.store().notes()[0].end_slot, 48);
        // The whole draw is one undo step
        assert!(s.store_mut().undo());
        assert!(s.store().is_empty());
        assert!(!s.store().can_undo());
    }

    #[test]
    fn press_out_of_range_row_is_a_no_op() {
        let mut e = engine();
        let mut s = seq();
        s.view_mut().bottom_row = 120.0; // window reaches past pitch 127
        let (x, y) = at(&s, 0.0, 130);
        e.pointer_down(&mut s, x, y, Modifiers::default());
        assert!(s.store().is_empty());
        assert!(e.is_idle());
    }

    #[test]
    fn drag_moves_note_in_one_undo_step() {
        let mut e = engine();
        let mut s = seq();
        let id = s
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        s.store_mut().clear_history();

        let (x, y) = at(&s, 6.0, 64);
        e.pointer_down(&mut s, x, y, Modifiers::default());
        for step in 1..=4u32 {
            let (x2, y2) = at(&s, 6.0 + (step * 12) as f64, 65);
            e.pointer_move(&mut s, x2, y2);
        }
        e.pointer_up(&mut s);

        let n = s.store().note(id).unwrap();
        assert_eq!(n.start_slot, 48);
        assert_eq!(n.kind, NoteKind::Melodic { pitch: 65 });
        assert!(s.store_mut().undo());
        let n = s.store().note(id).unwrap();
        assert_eq!(n.start_slot, 0);
        assert!(!s.store().can_undo());
    }

    #[test]
    fn copy_drag_materializes_only_on_release() {
        let mut e = engine();
        let mut s = seq();
        let id = s
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        s.selection.set_only(id);
        s.store_mut().clear_history();

        let (x, y) = at(&s, 6.0, 64);
        e.pointer_down(
            &mut s,
            x,
            y,
            Modifiers {
                alt: true,
                ..Default::default()
            },
        );
        let (x2, y2) = at(&s, 30.0, 64);
        e.pointer_move(&mut s, x2, y2);
        assert_eq!(s.store().notes().len(), 1); // nothing real yet
        assert_eq!(e.ghosts().len(), 1);
        assert_eq!(e.ghosts()[0].0, 24);
        e.pointer_up(&mut s);
        assert_eq!(s.store().notes().len(), 2);
        // The copy is the new selection; the original kept its place
        assert_eq!(s.store().note(id).unwrap().start_slot, 0);
    }

    #[test]
    fn additive_click_toggles_without_drag() {
        let mut e = engine();
        let mut s = seq();
        let id = s
            .store_mut()
            .create(0, 48, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        let (x, y) = at(&s, 24.0, 64);
        let mods = Modifiers {
            shift: true,
            ..Default::default()
        };
        e.pointer_down(&mut s, x, y, mods);
        assert!(s.selection.contains(id));
        assert!(e.is_idle());
        e.pointer_down(&mut s, x, y, mods);
        assert!(!s.selection.contains(id));
    }

    #[test]
    fn box_select_adds_intersecting_notes() {
        let mut e = engine();
        let mut s = seq();
        let a = s
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 62 })
            .unwrap();
        let b = s
            .store_mut()
            .create(48, 60, NoteKind::Melodic { pitch: 66 })
            .unwrap();
        let c = s
            .store_mut()
            .create(84, 96, NoteKind::Melodic { pitch: 70 })
            .unwrap();

        let (x0, y0) = at(&s, 0.0, 61);
        let (x1, y1) = at(&s, 64.0, 68);
        let mods = Modifiers {
            shift: true,
            ..Default::default()
        };
        e.pointer_down(&mut s, x0, y0, mods);
        e.pointer_move(&mut s, x1, y1);
        assert!(e.box_rect().is_some());
        e.pointer_up(&mut s);
        assert!(s.selection.contains(a));
        assert!(s.selection.contains(b));
        assert!(!s.selection.contains(c));
    }

    #[test]
    fn resize_right_keeps_minimum_duration() {
        let mut e = engine();
        let mut s = seq();
        let id = s
            .store_mut()
            .create(0, 48, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        let rect = coords::note_rect(s.view(), CanvasSize::default(), s.store().note(id).unwrap());
        let y = rect.y + rect.h / 2.0;
        e.pointer_down(&mut s, rect.x + rect.w - 1.0, y, Modifiers::default());
        // Drag the right edge far left of the start
        let (x2, _) = at(&s, -50.0, 64);
        e.pointer_move(&mut s, x2.max(0.0), y);
        e.pointer_up(&mut s);
        let n = s.store().note(id).unwrap();
        assert_eq!(n.start_slot, 0);
        assert_eq!(n.end_slot, 12); // one quantize step survives
    }

    #[test]
    fn group_drag_clamps_at_domain_edge() {
        let mut e = engine();
        let mut s = seq();
        let a = s
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        let b = s
            .store_mut()
            .create(24, 36, NoteKind::Melodic { pitch: 66 })
            .unwrap();
        s.selection.insert(a);
        s.selection.insert(b);

        let (x, y) = at(&s, 30.0, 66);
        e.pointer_down(&mut s, x, y, Modifiers::default());
        // Try to drag far left past slot 0
        let (x2, y2) = at(&s, -90.0, 66);
        e.pointer_move(&mut s, x2.max(0.0), y2);
        e.pointer_up(&mut s);
        assert_eq!(s.store().note(a).unwrap().start_slot, 0);
        assert_eq!(s.store().note(b).unwrap().start_slot, 24);
    }

    #[test]
    fn group_drag_moves_all_selected() {
        let mut e = engine();
        let mut s = seq();
        let a = s
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 64 })
            .unwrap();
        let b = s
            .store_mut()
            .create(24, 36, NoteKind::Melodic { pitch: 66 })
            .unwrap();
        s.selection.insert(a);
        s.selection.insert(b);

        let (x, y) = at(&s, 6.0, 64);
        e.pointer_down(&mut s, x, y, Modifiers::default());
        let (x2, y2) = at(&s, 18.0, 64);
        e.pointer_move(&mut s, x2, y2);
        e.pointer_up(&mut s);
        assert_eq!(s.store().note(a).unwrap().start_slot, 12);
        assert_eq!(s.store().note(b).unwrap().start_slot, 36);
    }
}
