use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use weft_core::input::{handle_wheel, Modifiers};
use weft_core::SequencerState;

use super::GridPane;

fn modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
    }
}

impl GridPane {
    /// Route a terminal mouse event into the pointer engine. Events landing
    /// outside the grid cancel any gesture in flight.
    pub fn handle_mouse(&mut self, event: &MouseEvent, seq: &mut SequencerState) {
        let Some((x, y)) = self.cell_to_px(event.column, event.row) else {
            if !matches!(event.kind, MouseEventKind::Moved) {
                self.pointer.cancel(seq);
            }
            return;
        };
        let mods = modifiers(event.modifiers);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.pointer.pointer_down(seq, x, y, mods);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.pointer.pointer_move(seq, x, y);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pointer.pointer_up(seq);
            }
            MouseEventKind::ScrollUp => {
                handle_wheel(seq, x, y, -1.0, mods, self.canvas);
            }
            MouseEventKind::ScrollDown => {
                handle_wheel(seq, x, y, 1.0, mods, self.canvas);
            }
            _ => {}
        }
    }
}
