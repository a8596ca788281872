use crate::coords::{self, CanvasSize, HitEdge};
use crate::grid;
use crate::input::pointer::{apply_delta, drag_delta, DragKind};
use crate::input::{FLICK_PX_PER_MS, LONG_PRESS_MS, TOUCH_SLOP_PX};
use crate::state::note::{NoteId, SequencerNote};
use crate::state::store::MAX_SLOT;
use crate::state::SequencerState;

/// Pending single-finger gesture whose meaning is not yet known.
#[derive(Debug, Clone, Copy)]
struct Pending {
    start: (f32, f32),
    start_ms: f64,
    hit: Option<(NoteId, HitEdge)>,
}

#[derive(Debug, Clone)]
enum TouchState {
    Idle,
    /// One finger down; draw vs scroll vs tap vs long-press not yet decided.
    Undecided(Pending),
    Drawing {
        anchor_slot: u32,
        note: NoteId,
    },
    Scrolling {
        last: (f32, f32),
    },
    Dragging {
        kind: DragKind,
        originals: Vec<SequencerNote>,
        grab_slot: f64,
        grab_row: i64,
    },
    Pinch {
        last: [(f32, f32); 2],
    },
}

/// Touch interaction state machine. Touch lacks modifier keys, so the states
/// `scroll` and `pinch` exist here and ambiguity is resolved from motion:
/// axis dominance plus a horizontal flick-velocity override, and a long-press
/// timer turning a hold on a note into a move drag.
///
/// Wall time arrives as `now_ms` parameters; the engine never reads a clock.
pub struct TouchEngine {
    canvas: CanvasSize,
    state: TouchState,
}

impl TouchEngine {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            state: TouchState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, TouchState::Idle)
    }

    fn touch_margin(&self) -> impl Fn(f32) -> f32 {
        coords::touch_edge_margin
    }

    /// A finger landed. `touches` is every active touch point.
    pub fn touch_start(
        &mut self,
        seq: &mut SequencerState,
        touches: &[(f32, f32)],
        now_ms: f64,
    ) {
        if touches.len() >= 2 {
            self.cancel_single_touch(seq);
            self.state = TouchState::Pinch {
                last: [touches[0], touches[1]],
            };
            return;
        }
        let Some(&(x, y)) = touches.first() else {
            return;
        };
        let view = *seq.view();
        let hit = coords::hit_test(
            seq.store().notes(),
            &view,
            self.canvas,
            x,
            y,
            self.touch_margin(),
        );
        match hit {
            // Edge grabs are unambiguous: resize immediately
            Some((id, edge)) if edge != HitEdge::Body => {
                let Some(note) = seq.store().note(id).copied() else {
                    return;
                };
                seq.selection.set_only(id);
                seq.store_mut().start_batch();
                self.state = TouchState::Dragging {
                    kind: if edge == HitEdge::Left {
                        DragKind::ResizeLeft
                    } else {
                        DragKind::ResizeRight
                    },
                    originals: vec![note],
                    grab_slot: coords::slot_at_x(&view, self.canvas, x),
                    grab_row: coords::row_at_y(&view, self.canvas, y),
                };
            }
            _ => {
                self.state = TouchState::Undecided(Pending {
                    start: (x, y),
                    start_ms: now_ms,
                    hit,
                });
            }
        }
    }

    /// Drive the long-press timer. Call once per frame while a touch is down.
    pub fn poll(&mut self, seq: &mut SequencerState, now_ms: f64) {
        let TouchState::Undecided(pending) = &self.state else {
            return;
        };
        let pending = *pending;
        let Some((id, HitEdge::Body)) = pending.hit else {
            return;
        };
        if now_ms - pending.start_ms < LONG_PRESS_MS {
            return;
        }
        // Timer fired with no significant movement: the hold becomes a move
        let view = *seq.view();
        let originals: Vec<SequencerNote> = if seq.selection.contains(id) {
            seq.store()
                .notes()
                .iter()
                .filter(|n| seq.selection.contains(n.id))
                .copied()
                .collect()
        } else {
            let Some(note) = seq.store().note(id).copied() else {
                self.state = TouchState::Idle;
                return;
            };
            seq.selection.set_only(id);
            vec![note]
        };
        seq.store_mut().start_batch();
        self.state = TouchState::Dragging {
            kind: DragKind::Move,
            originals,
            grab_slot: coords::slot_at_x(&view, self.canvas, pending.start.0),
            grab_row: coords::row_at_y(&view, self.canvas, pending.start.1),
        };
    }

    pub fn touch_move(
        &mut self,
        seq: &mut SequencerState,
        touches: &[(f32, f32)],
        now_ms: f64,
    ) {
        if touches.len() >= 2 {
            if !matches!(self.state, TouchState::Pinch { .. }) {
                self.cancel_single_touch(seq);
                self.state = TouchState::Pinch {
                    last: [touches[0], touches[1]],
                };
                return;
            }
            self.pinch_move(seq, [touches[0], touches[1]]);
            return;
        }
        let Some(&(x, y)) = touches.first() else {
            return;
        };
        match &mut self.state {
            TouchState::Idle | TouchState::Pinch { .. } => {}
            TouchState::Undecided(pending) => {
                let pending = *pending;
                let dx = x - pending.start.0;
                let dy = y - pending.start.1;
                if (dx * dx + dy * dy).sqrt() < TOUCH_SLOP_PX {
                    return;
                }
                self.resolve_single_move(seq, pending, (x, y), dx, dy, now_ms);
            }
            TouchState::Drawing { anchor_slot, note } => {
                let anchor = *anchor_slot;
                let id = *note;
                let view = *seq.view();
                let quantize = seq.quantize;
                let slot = coords::slot_at_x(&view, self.canvas, x).max(0.0) as u32;
                let end = grid::snap_round(slot, quantize)
                    .clamp(anchor + quantize.slot_span(), MAX_SLOT);
                seq.store_mut().update(id, |n| n.end_slot = end);
            }
            TouchState::Scrolling { last } => {
                let (lx, ly) = *last;
                *last = (x, y);
                let view = seq.view_mut();
                let dslots = -((x - lx) as f64 / self.canvas.width as f64) * view.span_slots;
                let drows = ((y - ly) as f64 / self.canvas.height as f64) * view.visible_rows;
                view.scroll_x(dslots);
                view.scroll_y(drows);
            }
            TouchState::Dragging {
                kind,
                originals,
                grab_slot,
                grab_row,
            } => {
                let kind = *kind;
                let grab_slot = *grab_slot;
                let grab_row = *grab_row;
                let originals = originals.clone();
                let view = *seq.view();
                let cur_slot = coords::slot_at_x(&view, self.canvas, x);
                let cur_row = coords::row_at_y(&view, self.canvas, y);
                let delta = drag_delta(
                    seq.mode,
                    seq.quantize,
                    &originals,
                    kind,
                    cur_slot - grab_slot,
                    cur_row - grab_row,
                );
                for n in &originals {
                    let (start, end, new_kind) = apply_delta(n, kind, delta);
                    seq.store_mut().update(n.id, |m| {
                        m.start_slot = start;
                        m.end_slot = end;
                        m.kind = new_kind;
                    });
                }
            }
        }
    }

    /// First significant single-finger movement: decide the gesture.
    fn resolve_single_move(
        &mut self,
        seq: &mut SequencerState,
        pending: Pending,
        cur: (f32, f32),
        dx: f32,
        dy: f32,
        now_ms: f64,
    ) {
        if pending.hit.is_some() {
            // Movement on a note before the long-press fired: pan
            self.begin_scroll(seq, pending.start, cur, now_ms);
            return;
        }
        if dy.abs() > dx.abs() {
            self.begin_scroll(seq, pending.start, cur, now_ms);
            return;
        }
        // Horizontal. A fast swipe is an intentional pan even though the
        // default meaning of horizontal is note-length drawing.
        let elapsed = (now_ms - pending.start_ms).max(1.0);
        let velocity = dx.abs() / elapsed as f32;
        if velocity > FLICK_PX_PER_MS {
            self.begin_scroll(seq, pending.start, cur, now_ms);
            return;
        }
        self.begin_draw(seq, pending.start, cur);
    }

    /// Enter scrolling from the original touch point so the displacement
    /// accumulated while the gesture was ambiguous is not lost.
    fn begin_scroll(
        &mut self,
        seq: &mut SequencerState,
        start: (f32, f32),
        cur: (f32, f32),
        now_ms: f64,
    ) {
        self.state = TouchState::Scrolling { last: start };
        self.touch_move(seq, &[cur], now_ms);
    }

    /// Start drawing at the original touch point, then immediately extend to
    /// the current one.
    fn begin_draw(&mut self, seq: &mut SequencerState, start: (f32, f32), cur: (f32, f32)) {
        let view = *seq.view();
        let slot = coords::slot_at_x(&view, self.canvas, start.0).max(0.0) as u32;
        let row = coords::row_at_y(&view, self.canvas, start.1);
        let Some(kind) = seq.kind_for_row(row) else {
            // Gesture classification failed to produce a valid note: fall
            // back to the safest interpretation and pan instead.
            self.state = TouchState::Scrolling { last: cur };
            return;
        };
        let quantize = seq.quantize;
        let start_slot = grid::snap_floor(slot.min(MAX_SLOT - 1), quantize);
        seq.store_mut().start_batch();
        match seq
            .store_mut()
            .create(start_slot, start_slot + quantize.slot_span(), kind)
        {
            Some(id) => {
                seq.selection.set_only(id);
                self.state = TouchState::Drawing {
                    anchor_slot: start_slot,
                    note: id,
                };
                self.touch_move(seq, &[cur], 0.0);
            }
            None => {
                seq.store_mut().end_batch();
                self.state = TouchState::Scrolling { last: cur };
            }
        }
    }

    pub fn touch_end(
        &mut self,
        seq: &mut SequencerState,
        remaining: &[(f32, f32)],
        now_ms: f64,
    ) {
        match std::mem::replace(&mut self.state, TouchState::Idle) {
            TouchState::Idle => {}
            TouchState::Undecided(pending) => {
                // Quick release with no significant movement: a tap
                let _ = now_ms;
                match pending.hit {
                    Some((id, _)) => {
                        seq.store_mut().remove(id);
                        seq.prune_selection();
                    }
                    None => {
                        self.tap_create(seq, pending.start);
                    }
                }
            }
            TouchState::Drawing { .. } | TouchState::Dragging { .. } => {
                seq.store_mut().end_batch();
            }
            TouchState::Scrolling { .. } => {}
            TouchState::Pinch { last } => {
                // One finger may remain; it continues as a pan
                if remaining.len() == 1 {
                    self.state = TouchState::Scrolling { last: remaining[0] };
                } else if remaining.len() >= 2 {
                    self.state = TouchState::Pinch { last };
                }
            }
        }
    }

    fn tap_create(&mut self, seq: &mut SequencerState, at: (f32, f32)) {
        let view = *seq.view();
        let slot = coords::slot_at_x(&view, self.canvas, at.0).max(0.0) as u32;
        let row = coords::row_at_y(&view, self.canvas, at.1);
        let Some(kind) = seq.kind_for_row(row) else {
            return;
        };
        let quantize = seq.quantize;
        let start = grid::snap_floor(slot.min(MAX_SLOT - 1), quantize);
        if let Some(id) = seq.store_mut().create(start, start + quantize.slot_span(), kind) {
            seq.selection.set_only(id);
        }
    }

    fn cancel_single_touch(&mut self, seq: &mut SequencerState) {
        match std::mem::replace(&mut self.state, TouchState::Idle) {
            TouchState::Drawing { note, .. } => {
                // The draw never happened as far as the user is concerned
                seq.store_mut().remove(note);
                seq.store_mut().end_batch();
                seq.prune_selection();
            }
            TouchState::Dragging { .. } => {
                seq.store_mut().end_batch();
            }
            _ => {}
        }
    }

    /// Classify the two-finger delta and apply center-anchored zoom. The
    /// same anchor math runs for every class so the point between the
    /// fingers stays fixed.
    fn pinch_move(&mut self, seq: &mut SequencerState, cur: [(f32, f32); 2]) {
        let TouchState::Pinch { last } = &mut self.state else {
            return;
        };
        let prev = *last;
        *last = cur;

        let old_w = (prev[0].0 - prev[1].0).abs().max(1.0);
        let new_w = (cur[0].0 - cur[1].0).abs().max(1.0);
        let old_h = (prev[0].1 - prev[1].1).abs().max(1.0);
        let new_h = (cur[0].1 - cur[1].1).abs().max(1.0);
        let dw = (new_w - old_w).abs();
        let dh = (new_h - old_h).abs();

        let cx = (cur[0].0 + cur[1].0) / 2.0;
        let cy = (cur[0].1 + cur[1].1) / 2.0;
        let anchor_x = (cx / self.canvas.width) as f64;
        let anchor_y = (1.0 - cy / self.canvas.height) as f64;

        let horizontal = dw > 2.0 * dh;
        let vertical = dh > 2.0 * dw;

        let view = seq.view_mut();
        if horizontal || !vertical {
            view.zoom_time((old_w / new_w) as f64, anchor_x);
        }
        if vertical || !horizontal {
            view.zoom_rows((old_h / new_h) as f64, anchor_y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::note::NoteKind;

    fn engine() -> TouchEngine {
        TouchEngine::new(CanvasSize::default())
    }

    fn seq() -> SequencerState {
        let mut s = SequencerState::new();
        let v = s.view_mut();
        v.start_slot = 0.0;
        v.span_slots = 96.0;
        v.bottom_row = 60.0;
        v.visible_rows = 12.0;
        s
    }

    fn at(seq: &SequencerState, slot: f64, row: i64) -> (f32, f32) {
        let c = CanvasSize::default();
        let x = coords::x_at_slot(seq.view(), c, slot);
        let y = coords::y_at_row_top(seq.view(), c, row) + coords::row_height(seq.view(), c) / 2.0;
        (x, y)
    }

    #[test]
    fn tap_on_empty_creates_one_step_note() {
        let mut e = engine();
        let mut s = seq();
        let p = at(&s, 26.0, 65);
        e.touch_start(&mut s, &[p], 0.0);
        e.touch_end(&mut s, &[], 80.0);
        let notes = s.store().notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].start_slot, 24);
        assert_eq!(notes[0].end_slot, 36);
    }

    #[test]
    fn tap_on_note_deletes_it() {
        let mut e = engine();
        let mut s = seq();
        let id = s
            .store_mut()
            .create(0, 48, NoteKind::Melodic { pitch: 65 })
            .unwrap();
        s.selection.insert(id);
        let p = at(&s, 24.0, 65);
        e.touch_start(&mut s, &[p], 0.0);
        e.touch_end(&mut s, &[], 80.0);
        assert!(s.store().is_empty());
        assert!(s.selection.is_empty());
    }

    #[test]
    fn slow_horizontal_movement_draws() {
        let mut e = engine();
        let mut s = seq();
        let p0 = at(&s, 0.5, 65);
        e.touch_start(&mut s, &[p0], 0.0);
        // 60 px over 400 ms: well under the flick threshold
        let p1 = (p0.0 + 60.0, p0.1);
        e.touch_move(&mut s, &[p1], 400.0);
        e.touch_end(&mut s, &[], 450.0);
        assert_eq!(s.store().notes().len(), 1);
        let n = &s.store().notes()[0];
        assert_eq!(n.start_slot, 0);
        assert!(n.end_slot > n.start_slot);
    }

    #[test]
    fn fast_horizontal_swipe_pans_instead_of_drawing() {
        let mut e = engine();
        let mut s = seq();
        s.view_mut().start_slot = 96.0;
        let p0 = at(&s, 144.0, 65);
        e.touch_start(&mut s, &[p0], 0.0);
        // 120 px in 50 ms: a flick
        let p1 = (p0.0 - 120.0, p0.1);
        e.touch_move(&mut s, &[p1], 50.0);
        e.touch_end(&mut s, &[], 60.0);
        assert!(s.store().is_empty());
        assert!(s.view().start_slot > 96.0); // panned forward in time
    }

    #[test]
    fn vertical_movement_scrolls() {
        let mut e = engine();
        let mut s = seq();
        let before = s.view().bottom_row;
        let p0 = at(&s, 48.0, 65);
        e.touch_start(&mut s, &[p0], 0.0);
        e.touch_move(&mut s, &[(p0.0, p0.1 + 90.0)], 100.0);
        e.touch_end(&mut s, &[], 120.0);
        assert!(s.store().is_empty());
        assert!(s.view().bottom_row > before);
    }

    #[test]
    fn long_press_becomes_move_drag() {
        let mut e = engine();
        let mut s = seq();
        let id = s
            .store_mut()
            .create(0, 12, NoteKind::Melodic { pitch: 65 })
            .unwrap();
        s.store_mut().clear_history();
        let p = at(&s, 6.0, 65);
        e.touch_start(&mut s, &[p], 0.0);
        e.poll(&mut s, 100.0); // too early
        assert!(s.store().note(id).unwrap().start_slot == 0);
        e.poll(&mut s, 400.0); // timer fires
        let p2 = at(&s, 30.0, 65);
        e.touch_move(&mut s, &[p2], 420.0);
        e.touch_end(&mut s, &[], 430.0);
        assert_eq!(s.store().note(id).unwrap().start_slot, 24);
        // Whole drag is one undo step
        assert!(s.store_mut().undo());
        assert_eq!(s.store().note(id).unwrap().start_slot, 0);
        assert!(!s.store().can_undo());
    }

    #[test]
    fn second_finger_cancels_draw_and_enters_pinch() {
        let mut e = engine();
        let mut s = seq();
        let p0 = at(&s, 0.5, 65);
        e.touch_start(&mut s, &[p0], 0.0);
        let p1 = (p0.0 + 40.0, p0.1);
        e.touch_move(&mut s, &[p1], 300.0); // drawing now
        assert_eq!(s.store().notes().len(), 1);
        let p2 = (p1.0 + 200.0, p1.1);
        e.touch_start(&mut s, &[p1, p2], 320.0);
        // The half-drawn note is gone and pinch owns the gesture
        assert!(s.store().is_empty());
        assert!(!e.is_idle());
    }

    #[test]
    fn horizontal_pinch_zooms_time_around_center() {
        let mut e = engine();
        let mut s = seq();
        let a = (400.0, 270.0);
        let b = (560.0, 270.0);
        e.touch_start(&mut s, &[a, b], 0.0);
        let center_slot = coords::slot_at_x(s.view(), CanvasSize::default(), 480.0);
        // Spread horizontally: zoom in on the time axis
        e.touch_move(&mut s, &[(360.0, 270.0), (600.0, 270.0)], 50.0);
        assert!(s.view().span_slots < 96.0);
        let center_after = coords::slot_at_x(s.view(), CanvasSize::default(), 480.0);
        assert!((center_after - center_slot).abs() < 1.0);
    }

    #[test]
    fn vertical_pinch_zooms_rows_in_melodic_mode() {
        let mut e = engine();
        let mut s = seq();
        s.view_mut().visible_rows = 30.0;
        let a = (480.0, 200.0);
        let b = (480.0, 340.0);
        e.touch_start(&mut s, &[a, b], 0.0);
        e.touch_move(&mut s, &[(480.0, 120.0), (480.0, 420.0)], 50.0);
        assert!(s.view().visible_rows < 30.0);
        assert!((s.view().span_slots - 96.0).abs() < 1e-9);
    }

    #[test]
    fn pinch_release_to_one_finger_continues_as_pan() {
        let mut e = engine();
        let mut s = seq();
        e.touch_start(&mut s, &[(100.0, 100.0), (300.0, 100.0)], 0.0);
        e.touch_end(&mut s, &[(100.0, 100.0)], 50.0);
        let before = s.view().start_slot;
        e.touch_move(&mut s, &[(40.0, 100.0)], 80.0);
        assert!(s.view().start_slot > before);
        e.touch_end(&mut s, &[], 100.0);
        assert!(e.is_idle());
    }
}
