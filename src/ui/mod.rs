pub mod keybindings;
pub mod keymap;

pub use keymap::{KeyBinding, KeyPattern, Keymap};
