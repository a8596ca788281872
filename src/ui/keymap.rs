use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A key notation pattern matched against incoming terminal key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    Char(char),
    Key(KeyCode),
    Ctrl(char),
    Alt(char),
    CtrlKey(KeyCode),
    ShiftKey(KeyCode),
}

impl KeyPattern {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match self {
            KeyPattern::Char(c) => {
                event.code == KeyCode::Char(*c)
                    && !event.modifiers.contains(KeyModifiers::CONTROL)
                    && !event.modifiers.contains(KeyModifiers::ALT)
            }
            KeyPattern::Key(code) => event.code == *code && event.modifiers.is_empty(),
            KeyPattern::Ctrl(c) => {
                event.code == KeyCode::Char(*c)
                    && event.modifiers.contains(KeyModifiers::CONTROL)
            }
            KeyPattern::Alt(c) => {
                event.code == KeyCode::Char(*c) && event.modifiers.contains(KeyModifiers::ALT)
            }
            KeyPattern::CtrlKey(code) => {
                event.code == *code && event.modifiers.contains(KeyModifiers::CONTROL)
            }
            KeyPattern::ShiftKey(code) => {
                event.code == *code && event.modifiers.contains(KeyModifiers::SHIFT)
            }
        }
    }
}

/// One binding: key notation, pattern, action name, help text.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: &'static str,
    pub pattern: KeyPattern,
    pub action: &'static str,
    pub description: &'static str,
}

/// Ordered binding list; first match wins.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    pub fn from_bindings(bindings: Vec<KeyBinding>) -> Self {
        Self { bindings }
    }

    pub fn resolve(&self, event: &KeyEvent) -> Option<&'static str> {
        self.bindings
            .iter()
            .find(|b| b.pattern.matches(event))
            .map(|b| b.action)
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// One-line help text built from every described binding, in order.
    pub fn help_line(&self) -> String {
        self.bindings()
            .iter()
            .filter(|b| !b.description.is_empty())
            .map(|b| format!("{} {}", b.key, b.description))
            .collect::<Vec<_>>()
            .join("  ")
    }
}
