use std::path::PathBuf;

use crossterm::event::KeyCode;
use serde::Deserialize;

use weft_core::{Action, EditMode};

use super::keymap::{KeyBinding, KeyPattern, Keymap};

/// Raw TOML structure of the keybindings file.
#[derive(Deserialize)]
struct KeybindingConfig {
    bindings: Vec<RawBinding>,
}

#[derive(Deserialize)]
struct RawBinding {
    key: String,
    action: String,
    description: String,
}

/// Intern a String into a &'static str. Loaded once at startup, never freed.
fn intern(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Parse a key notation string into a KeyPattern.
///
/// Supported formats:
/// - `"q"` → Char('q')
/// - `"Up"` → Key(KeyCode::Up)
/// - `"Ctrl+s"` → Ctrl('s')
/// - `"Alt+x"` → Alt('x')
/// - `"Shift+Right"` → ShiftKey(KeyCode::Right)
fn parse_key(s: &str) -> KeyPattern {
    if let Some(rest) = s.strip_prefix("Ctrl+") {
        if rest.len() == 1 {
            KeyPattern::Ctrl(rest.chars().next().unwrap())
        } else {
            KeyPattern::CtrlKey(parse_named_key(rest))
        }
    } else if let Some(rest) = s.strip_prefix("Alt+") {
        KeyPattern::Alt(rest.chars().next().unwrap())
    } else if let Some(rest) = s.strip_prefix("Shift+") {
        KeyPattern::ShiftKey(parse_named_key(rest))
    } else if s.len() == 1 {
        KeyPattern::Char(s.chars().next().unwrap())
    } else if s == "Space" {
        KeyPattern::Char(' ')
    } else {
        KeyPattern::Key(parse_named_key(s))
    }
}

fn parse_named_key(s: &str) -> KeyCode {
    match s {
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Enter" => KeyCode::Enter,
        "Escape" => KeyCode::Esc,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Delete" => KeyCode::Delete,
        _ => panic!("Unknown key: {}", s),
    }
}

/// Map an action name from the TOML onto a sequencer action.
pub fn parse_action(name: &str) -> Action {
    match name {
        "quit" => Action::Quit,
        "delete" => Action::DeleteSelection,
        "select_all" => Action::SelectAll,
        "clear_selection" => Action::ClearSelection,
        "undo" => Action::Undo,
        "redo" => Action::Redo,
        "copy" => Action::Copy,
        "cut" => Action::Cut,
        "paste" => Action::Paste,
        "cursor_left" => Action::MoveCursor(-1),
        "cursor_right" => Action::MoveCursor(1),
        "cycle_quantize" => Action::CycleQuantize,
        "quantize_all" => Action::QuantizeAll,
        "mode_melodic" => Action::SwitchMode(EditMode::Melodic),
        "mode_percussive" => Action::SwitchMode(EditMode::Percussive),
        "toggle_mode" => Action::ToggleMode,
        "toggle_play" => Action::TogglePlay,
        "compile" => Action::Compile,
        "clear_notes" => Action::ClearNotes,
        _ => {
            if let Some(n) = name.strip_prefix("cycles_") {
                if let Ok(n) = n.parse() {
                    return Action::SetPatternCycles(n);
                }
            }
            log::warn!("unknown keybinding action: {name}");
            Action::None
        }
    }
}

/// Embedded default keybindings TOML.
const DEFAULT_KEYBINDINGS: &str = include_str!("../../keybindings.toml");

/// Load the keymap: embedded default, user override layered on top (user
/// bindings come first so they shadow defaults for the same key).
pub fn load_keymap() -> Keymap {
    let config: KeybindingConfig =
        toml::from_str(DEFAULT_KEYBINDINGS).expect("embedded keybindings.toml is valid");

    let mut bindings = Vec::new();
    if let Some(path) = user_keybindings_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            match toml::from_str::<KeybindingConfig>(&contents) {
                Ok(user) => bindings.extend(build_bindings(&user.bindings)),
                Err(e) => log::warn!("ignoring malformed {}: {}", path.display(), e),
            }
        }
    }
    bindings.extend(build_bindings(&config.bindings));
    Keymap::from_bindings(bindings)
}

fn user_keybindings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("weft").join("keybindings.toml"))
}

fn build_bindings(raw: &[RawBinding]) -> Vec<KeyBinding> {
    raw.iter()
        .map(|b| KeyBinding {
            key: intern(b.key.clone()),
            pattern: parse_key(&b.key),
            action: intern(b.action.clone()),
            description: intern(b.description.clone()),
        })
        .collect()
}
