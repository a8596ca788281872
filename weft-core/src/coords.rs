//! Pure transforms between canvas pixels, grid rows, and time slots.
//!
//! The canvas has a fixed logical pixel size; zoom and scroll only change the
//! ViewState window, so hit testing and gesture math never depend on device
//! pixel ratio or host resizing.

use crate::state::note::{NoteId, SequencerNote};
use crate::state::view::ViewState;

/// Fixed logical canvas size. Hosts scale their native coordinates onto this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
        }
    }
}

/// An axis-aligned rectangle in logical canvas pixels. y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PxRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl PxRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// Smallest rect covering two corner points.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> PxRect {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        PxRect {
            x,
            y,
            w: (a.0 - b.0).abs(),
            h: (a.1 - b.1).abs(),
        }
    }

    pub fn intersects(&self, other: &PxRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// Which part of a note a point landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitEdge {
    Left,
    Right,
    Body,
}

/// Edge grab margin for mouse input, in logical pixels.
pub const POINTER_EDGE_MARGIN: f32 = 6.0;

/// Edge grab margin for touch input: wider, because fingers are imprecise.
pub fn touch_edge_margin(note_width: f32) -> f32 {
    (note_width * 0.2).max(20.0)
}

pub fn slot_at_x(view: &ViewState, canvas: CanvasSize, x: f32) -> f64 {
    view.start_slot + (x as f64 / canvas.width as f64) * view.span_slots
}

pub fn x_at_slot(view: &ViewState, canvas: CanvasSize, slot: f64) -> f32 {
    (((slot - view.start_slot) / view.span_slots) * canvas.width as f64) as f32
}

/// Grid row under a y pixel. Row 0 is at the bottom edge; the result may be
/// outside the valid domain and must go through the state's validity gate.
pub fn row_at_y(view: &ViewState, canvas: CanvasSize, y: f32) -> i64 {
    let frac = 1.0 - (y as f64 / canvas.height as f64);
    (view.bottom_row + frac * view.visible_rows).floor() as i64
}

/// Pixel height of one grid row.
pub fn row_height(view: &ViewState, canvas: CanvasSize) -> f32 {
    (canvas.height as f64 / view.visible_rows) as f32
}

/// Top y of a row's band.
pub fn y_at_row_top(view: &ViewState, canvas: CanvasSize, row: i64) -> f32 {
    let frac = (row as f64 + 1.0 - view.bottom_row) / view.visible_rows;
    (canvas.height as f64 * (1.0 - frac)) as f32
}

/// On-canvas bounding box for a note.
pub fn note_rect(view: &ViewState, canvas: CanvasSize, note: &SequencerNote) -> PxRect {
    let x = x_at_slot(view, canvas, note.start_slot as f64);
    let x_end = x_at_slot(view, canvas, note.end_slot as f64);
    let row = note.kind.row() as i64;
    PxRect {
        x,
        y: y_at_row_top(view, canvas, row),
        w: x_end - x,
        h: row_height(view, canvas),
    }
}

/// Hit test a point against the note set. Later notes sit on top. The margin
/// function maps a note's pixel width to its edge grab width, so pointer and
/// touch can use different precision.
pub fn hit_test<F>(
    notes: &[SequencerNote],
    view: &ViewState,
    canvas: CanvasSize,
    x: f32,
    y: f32,
    margin_for: F,
) -> Option<(NoteId, HitEdge)>
where
    F: Fn(f32) -> f32,
{
    for note in notes.iter().rev() {
        let rect = note_rect(view, canvas, note);
        if !rect.contains(x, y) {
            continue;
        }
        // Never let the two edge zones swallow the whole body
        let margin = margin_for(rect.w).min(rect.w / 3.0);
        let edge = if x < rect.x + margin {
            HitEdge::Left
        } else if x > rect.x + rect.w - margin {
            HitEdge::Right
        } else {
            HitEdge::Body
        };
        return Some((note.id, edge));
    }
    None
}
