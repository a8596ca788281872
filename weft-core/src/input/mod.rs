//! Input modality engines. Each modality owns a small state machine over the
//! shared note-mutation primitives; all geometry goes through the coordinate
//! mapper and all snapping through the quantizer.

pub mod pointer;
pub mod touch;
pub mod wheel;

pub use pointer::{DragKind, PointerEngine};
pub use touch::TouchEngine;
pub use wheel::handle_wheel;

/// Keyboard modifiers as the host reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Additive-selection modifier (toggle membership, box select).
    pub fn additive(self) -> bool {
        self.shift
    }

    /// Copy-drag modifier.
    pub fn copy(self) -> bool {
        self.alt
    }
}

/// Movement below this many logical pixels is jitter, not a gesture.
pub const TOUCH_SLOP_PX: f32 = 8.0;

/// A horizontal swipe faster than this is a pan even though horizontal
/// movement defaults to note drawing.
pub const FLICK_PX_PER_MS: f32 = 0.5;

/// How long a finger must rest on a note before the gesture becomes a move.
pub const LONG_PRESS_MS: f64 = 350.0;
