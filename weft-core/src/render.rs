//! Resolution-independent draw list. The core describes one frame as a list
//! of primitives in logical pixels; hosts rasterize them however they like.

use crate::coords::{self, CanvasSize, PxRect};
use crate::grid::SLOTS_PER_CYCLE;
use crate::state::note::NoteKind;
use crate::state::{EditMode, SequencerState};

/// Visual weight of a vertical grid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEmphasis {
    /// One quantize step.
    Step,
    /// A quarter-cycle beat.
    Beat,
    /// A cycle boundary.
    Cycle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    RowBand { rect: PxRect, accent: bool },
    GridLine { x: f32, emphasis: LineEmphasis },
    Note { rect: PxRect, kind: NoteKind, selected: bool },
    Ghost { rect: PxRect, kind: NoteKind },
    SelectBox { rect: PxRect },
    PasteCursor { x: f32 },
    Playhead { x: f32 },
}

/// Transient pointer visuals the builder overlays on top of the note layer.
#[derive(Debug, Default)]
pub struct Overlay<'a> {
    pub ghosts: &'a [(u32, u32, NoteKind)],
    pub select_box: Option<PxRect>,
}

const SLOTS_PER_BEAT: u32 = SLOTS_PER_CYCLE / 4;

/// Back-to-front: row bands, grid lines, notes, then transient overlays.
pub fn build_draw_list(
    seq: &SequencerState,
    overlay: &Overlay,
    canvas: CanvasSize,
    playhead_slot: Option<f64>,
) -> Vec<DrawCmd> {
    let view = seq.view();
    let mut cmds = Vec::new();

    let first_row = view.bottom_row.floor() as i64;
    let last_row = (view.bottom_row + view.visible_rows).ceil() as i64;
    for row in first_row..=last_row {
        if row < 0 || row >= view.row_count as i64 {
            continue;
        }
        let top = coords::y_at_row_top(view, canvas, row);
        let rect = PxRect {
            x: 0.0,
            y: top,
            w: canvas.width,
            h: coords::row_height(view, canvas),
        };
        cmds.push(DrawCmd::RowBand {
            rect,
            accent: row_accent(seq.mode, row),
        });
    }

    let step = seq.quantize.slot_span();
    let first_slot = (view.start_slot.floor() as i64).max(0) as u32 / step * step;
    let last_slot = (view.start_slot + view.span_slots).ceil() as u32;
    let mut slot = first_slot;
    while slot <= last_slot {
        let emphasis = if slot % SLOTS_PER_CYCLE == 0 {
            LineEmphasis::Cycle
        } else if slot % SLOTS_PER_BEAT == 0 {
            LineEmphasis::Beat
        } else {
            LineEmphasis::Step
        };
        cmds.push(DrawCmd::GridLine {
            x: coords::x_at_slot(view, canvas, slot as f64),
            emphasis,
        });
        slot += step;
    }

    let frame = PxRect {
        x: 0.0,
        y: 0.0,
        w: canvas.width,
        h: canvas.height,
    };
    for note in seq.store().notes() {
        let rect = coords::note_rect(view, canvas, note);
        if !rect.intersects(&frame) {
            continue;
        }
        cmds.push(DrawCmd::Note {
            rect,
            kind: note.kind,
            selected: seq.selection.contains(note.id),
        });
    }

    for &(start, end, kind) in overlay.ghosts {
        let ghost = crate::state::note::SequencerNote {
            id: crate::state::note::NoteId(0),
            start_slot: start,
            end_slot: end,
            kind,
        };
        let rect = coords::note_rect(view, canvas, &ghost);
        if rect.intersects(&frame) {
            cmds.push(DrawCmd::Ghost { rect, kind });
        }
    }

    if let Some(rect) = overlay.select_box {
        cmds.push(DrawCmd::SelectBox { rect });
    }

    cmds.push(DrawCmd::PasteCursor {
        x: coords::x_at_slot(view, canvas, seq.paste_cursor as f64),
    });

    if let Some(slot) = playhead_slot {
        let x = coords::x_at_slot(view, canvas, slot);
        if x >= 0.0 && x <= canvas.width {
            cmds.push(DrawCmd::Playhead { x });
        }
    }

    cmds
}

/// Melodic accents mark black keys; percussive rows just alternate.
fn row_accent(mode: EditMode, row: i64) -> bool {
    match mode {
        EditMode::Melodic => matches!(row.rem_euclid(12), 1 | 3 | 6 | 8 | 10),
        EditMode::Percussive => row % 2 == 1,
    }
}
