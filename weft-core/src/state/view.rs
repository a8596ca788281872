use crate::grid::{MAX_CYCLES, SLOTS_PER_CYCLE};

/// Widest allowed time window, in slots.
pub const MAX_SPAN_SLOTS: f64 = (SLOTS_PER_CYCLE * MAX_CYCLES) as f64;
/// Narrowest allowed time window: half a cycle.
pub const MIN_SPAN_SLOTS: f64 = (SLOTS_PER_CYCLE / 2) as f64;

const MELODIC_ROWS: f64 = 128.0;
const MIN_VISIBLE_PITCHES: f64 = 12.0;

/// The visible window onto the grid for one editing mode.
///
/// The canvas pixel size is fixed; zooming and scrolling only move this
/// window. Offsets and spans are in slot/row units and may be fractional for
/// smooth pinch zoom — note timing itself stays integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub start_slot: f64,
    pub span_slots: f64,
    pub bottom_row: f64,
    pub visible_rows: f64,
    /// Total rows in the domain: 128 pitches or the drum palette length.
    pub row_count: f64,
    /// Whether vertical zoom is allowed (melodic mode only).
    pub vertical_zoom: bool,
}

impl ViewState {
    pub fn melodic() -> Self {
        Self {
            start_slot: 0.0,
            span_slots: (SLOTS_PER_CYCLE * 2) as f64,
            bottom_row: 48.0, // C3 at the bottom, like a piano roll opening view
            visible_rows: 25.0,
            row_count: MELODIC_ROWS,
            vertical_zoom: true,
        }
    }

    pub fn percussive(row_count: usize) -> Self {
        Self {
            start_slot: 0.0,
            span_slots: (SLOTS_PER_CYCLE * 2) as f64,
            bottom_row: 0.0,
            visible_rows: row_count as f64,
            row_count: row_count as f64,
            vertical_zoom: false,
        }
    }

    /// Clamp the window to the hard domain bounds.
    pub fn clamp(&mut self) {
        self.span_slots = self.span_slots.clamp(MIN_SPAN_SLOTS, MAX_SPAN_SLOTS);
        self.start_slot = self.start_slot.clamp(0.0, MAX_SPAN_SLOTS - self.span_slots);
        let min_rows = if self.vertical_zoom {
            MIN_VISIBLE_PITCHES
        } else {
            self.row_count
        };
        self.visible_rows = self.visible_rows.clamp(min_rows, self.row_count);
        self.bottom_row = self.bottom_row.clamp(0.0, self.row_count - self.visible_rows);
    }

    pub fn scroll_x(&mut self, delta_slots: f64) {
        self.start_slot += delta_slots;
        self.clamp();
    }

    pub fn scroll_y(&mut self, delta_rows: f64) {
        self.bottom_row += delta_rows;
        self.clamp();
    }

    /// Horizontal zoom anchored at a fraction of the canvas width so the slot
    /// under the cursor/fingers stays put. `factor > 1` zooms out.
    pub fn zoom_time(&mut self, factor: f64, anchor_frac: f64) {
        let anchor_slot = self.start_slot + anchor_frac * self.span_slots;
        self.span_slots *= factor;
        self.span_slots = self.span_slots.clamp(MIN_SPAN_SLOTS, MAX_SPAN_SLOTS);
        self.start_slot = anchor_slot - anchor_frac * self.span_slots;
        self.clamp();
    }

    /// Vertical zoom anchored at a fraction of the canvas height, measured
    /// from the bottom. No-op in modes without vertical zoom.
    pub fn zoom_rows(&mut self, factor: f64, anchor_frac: f64) {
        if !self.vertical_zoom {
            return;
        }
        let anchor_row = self.bottom_row + anchor_frac * self.visible_rows;
        self.visible_rows *= factor;
        self.visible_rows = self.visible_rows.clamp(MIN_VISIBLE_PITCHES, self.row_count);
        self.bottom_row = anchor_row - anchor_frac * self.visible_rows;
        self.clamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_window_in_domain() {
        let mut v = ViewState::melodic();
        v.start_slot = -50.0;
        v.clamp();
        assert_eq!(v.start_slot, 0.0);

        v.start_slot = MAX_SPAN_SLOTS;
        v.clamp();
        assert_eq!(v.start_slot, MAX_SPAN_SLOTS - v.span_slots);

        v.bottom_row = 1000.0;
        v.clamp();
        assert_eq!(v.bottom_row, v.row_count - v.visible_rows);
    }

    #[test]
    fn zoom_time_keeps_anchor_slot_fixed() {
        let mut v = ViewState::melodic();
        v.start_slot = 96.0;
        v.span_slots = 96.0;
        let anchor_frac = 0.25;
        let anchor_slot = v.start_slot + anchor_frac * v.span_slots;
        v.zoom_time(1.5, anchor_frac);
        let new_anchor = v.start_slot + anchor_frac * v.span_slots;
        assert!((new_anchor - anchor_slot).abs() < 1e-9);
    }

    #[test]
    fn zoom_time_clamps_span() {
        let mut v = ViewState::melodic();
        v.zoom_time(1000.0, 0.5);
        assert_eq!(v.span_slots, MAX_SPAN_SLOTS);
        assert_eq!(v.start_slot, 0.0);
        v.zoom_time(1e-9, 0.5);
        assert_eq!(v.span_slots, MIN_SPAN_SLOTS);
    }

    #[test]
    fn percussive_view_has_no_vertical_zoom() {
        let mut v = ViewState::percussive(9);
        let before = v.visible_rows;
        v.zoom_rows(0.5, 0.5);
        assert_eq!(v.visible_rows, before);
        assert_eq!(v.bottom_row, 0.0);
    }
}
