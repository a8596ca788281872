use crate::state::EditMode;

/// Keyboard-level commands against the sequencer. Front ends map their own
/// key events onto these; dispatch applies them to the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DeleteSelection,
    SelectAll,
    ClearSelection,
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    /// Move the paste cursor by this many quantize steps.
    MoveCursor(i32),
    CycleQuantize,
    QuantizeAll,
    SwitchMode(EditMode),
    ToggleMode,
    SetPatternCycles(u32),
    TogglePlay,
    /// Compile the grid to notation text; the result rides the DispatchResult.
    Compile,
    ClearNotes,
    Quit,
    None,
}

/// What the host loop should do after a dispatch.
#[derive(Debug, Default, PartialEq)]
pub struct DispatchResult {
    pub quit: bool,
    pub compiled: Option<String>,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    pub fn with_compiled(text: String) -> Self {
        Self {
            compiled: Some(text),
            ..Self::default()
        }
    }
}
