use log::info;

use crate::action::{Action, DispatchResult};
use crate::state::SequencerState;

/// Apply a keyboard action to the sequencer. Pointer, touch and wheel input
/// go through their own engines; everything key-driven funnels through here.
pub fn dispatch_action(action: &Action, state: &mut SequencerState) -> DispatchResult {
    match action {
        Action::Quit => DispatchResult::with_quit(),
        Action::None => DispatchResult::none(),

        Action::DeleteSelection => {
            state.delete_selection();
            DispatchResult::none()
        }
        Action::SelectAll => {
            let ids: Vec<_> = state.store().notes().iter().map(|n| n.id).collect();
            for id in ids {
                state.selection.insert(id);
            }
            DispatchResult::none()
        }
        Action::ClearSelection => {
            state.selection.clear();
            DispatchResult::none()
        }

        Action::Undo => {
            state.store_mut().undo();
            state.prune_selection();
            DispatchResult::none()
        }
        Action::Redo => {
            state.store_mut().redo();
            state.prune_selection();
            DispatchResult::none()
        }

        Action::Copy => {
            state.copy_selection();
            DispatchResult::none()
        }
        Action::Cut => {
            state.cut_selection();
            DispatchResult::none()
        }
        Action::Paste => {
            state.paste();
            DispatchResult::none()
        }
        Action::MoveCursor(steps) => {
            state.move_paste_cursor(*steps);
            DispatchResult::none()
        }

        Action::CycleQuantize => {
            state.cycle_quantize();
            info!("quantize: {}", state.quantize.label());
            DispatchResult::none()
        }
        Action::QuantizeAll => {
            state.quantize_all();
            DispatchResult::none()
        }

        Action::SwitchMode(mode) => {
            state.switch_mode(*mode);
            DispatchResult::none()
        }
        Action::ToggleMode => {
            state.toggle_mode();
            DispatchResult::none()
        }
        Action::SetPatternCycles(n) => {
            state.set_pattern_cycles(*n);
            DispatchResult::none()
        }

        Action::TogglePlay => {
            state.playing = !state.playing;
            info!("playback {}", if state.playing { "started" } else { "stopped" });
            DispatchResult::none()
        }
        Action::Compile => {
            let text = state.compile();
            DispatchResult::with_compiled(text)
        }
        Action::ClearNotes => {
            state.selection.clear();
            state.store_mut().clear();
            DispatchResult::none()
        }
    }
}
