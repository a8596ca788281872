use crate::coords::CanvasSize;
use crate::input::Modifiers;
use crate::state::SequencerState;

/// How far one wheel notch zooms. Positive delta zooms out.
const ZOOM_STEP: f64 = 1.1;
/// Plain-wheel horizontal pan, as a fraction of the visible span per notch.
const PAN_FRACTION: f64 = 0.1;

/// Route a wheel event by its modifier keys. `delta` is in notches, positive
/// meaning wheel-down. `(x, y)` is the cursor position in logical pixels and
/// anchors ctrl-zoom so the slot under the cursor stays put.
pub fn handle_wheel(
    seq: &mut SequencerState,
    x: f32,
    y: f32,
    delta: f64,
    mods: Modifiers,
    canvas: CanvasSize,
) {
    let factor = if delta > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };

    let view = seq.view_mut();
    if mods.ctrl {
        let anchor = (x / canvas.width) as f64;
        view.zoom_time(factor, anchor);
    } else if mods.alt {
        let anchor = (1.0 - y / canvas.height) as f64;
        view.zoom_rows(factor, anchor);
    } else if mods.shift {
        view.scroll_y(-delta * view.visible_rows * PAN_FRACTION);
    } else {
        view.scroll_x(delta * view.span_slots * PAN_FRACTION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords;
    use crate::state::EditMode;

    fn seq() -> SequencerState {
        let mut s = SequencerState::new();
        let v = s.view_mut();
        v.start_slot = 96.0;
        v.span_slots = 96.0;
        v.bottom_row = 60.0;
        v.visible_rows = 12.0;
        s
    }

    #[test]
    fn plain_wheel_pans_time() {
        let mut s = seq();
        handle_wheel(&mut s, 0.0, 0.0, 1.0, Modifiers::default(), CanvasSize::default());
        assert!((s.view().start_slot - 105.6).abs() < 1e-9);
        handle_wheel(&mut s, 0.0, 0.0, -1.0, Modifiers::default(), CanvasSize::default());
        assert!((s.view().start_slot - 96.0).abs() < 1e-9);
    }

    #[test]
    fn shift_wheel_pans_rows() {
        let mut s = seq();
        let before = s.view().bottom_row;
        let mods = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        handle_wheel(&mut s, 0.0, 0.0, 1.0, mods, CanvasSize::default());
        assert!(s.view().bottom_row < before);
    }

    #[test]
    fn ctrl_wheel_zooms_time_anchored_at_cursor() {
        let mut s = seq();
        let c = CanvasSize::default();
        let mods = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        let cursor_slot = coords::slot_at_x(s.view(), c, 240.0);
        handle_wheel(&mut s, 240.0, 100.0, -1.0, mods, c);
        assert!(s.view().span_slots < 96.0);
        let after = coords::slot_at_x(s.view(), c, 240.0);
        assert!((after - cursor_slot).abs() < 1e-6);
    }

    #[test]
    fn alt_wheel_zoom_is_ignored_in_percussive_mode() {
        let mut s = seq();
        s.switch_mode(EditMode::Percussive);
        let rows_before = s.view().visible_rows;
        let mods = Modifiers {
            alt: true,
            ..Modifiers::default()
        };
        handle_wheel(&mut s, 0.0, 200.0, -1.0, mods, CanvasSize::default());
        assert!((s.view().visible_rows - rows_before).abs() < 1e-9);
    }
}
