use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::Message;

/// Rows scrolled per mouse wheel notch.
const WHEEL_ROWS: i64 = 3;

/// A declarative keybinding map that can be composed and extended.
#[derive(Clone)]
pub struct Keymap {
    bindings: Vec<(KeyCode, KeyModifiers, Message)>,
}

impl Keymap {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a key binding with no modifiers.
    pub fn bind(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::NONE, message));
        self
    }

    /// Add a key binding with Ctrl modifier.
    pub fn bind_ctrl(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::CONTROL, message));
        self
    }

    /// Look up a message for a key event.
    /// Later bindings take precedence over earlier ones.
    pub fn get(&self, event: &KeyEvent) -> Option<Message> {
        self.bindings
            .iter()
            .rev()
            .find(|(code, mods, _)| *code == event.code && event.modifiers.contains(*mods))
            .map(|(_, _, msg)| msg.clone())
    }

    /// Extend this keymap with another. The other keymap's bindings take precedence.
    pub fn extend(mut self, other: Self) -> Self {
        self.bindings.extend(other.bindings);
        self
    }

    /// Find the first key bound to a specific message.
    pub fn find_key(&self, message: &Message) -> Option<(KeyCode, KeyModifiers)> {
        self.bindings
            .iter()
            .find(|(_, _, msg)| msg == message)
            .map(|(code, mods, _)| (*code, *mods))
    }
}

/// Format a key binding for display in help text.
pub fn format_key(code: KeyCode, mods: KeyModifiers) -> String {
    let key_str = match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        KeyCode::Delete => "Del".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "S-Tab".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "?".to_string(),
    };
    if mods.contains(KeyModifiers::CONTROL) {
        format!("C-{key_str}")
    } else if mods.contains(KeyModifiers::ALT) {
        format!("M-{key_str}")
    } else {
        key_str
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys that work regardless of which field has focus.
pub fn global_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Esc, Message::Quit)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
        .bind(KeyCode::F(2), Message::ToggleDebug)
        .bind(KeyCode::Tab, Message::FocusNext)
        .bind(KeyCode::BackTab, Message::FocusNext)
        .bind(KeyCode::Enter, Message::Submit)
}

/// Message pane scrolling.
pub fn scroll_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Up, Message::ScrollBy(-1))
        .bind(KeyCode::Down, Message::ScrollBy(1))
        .bind(KeyCode::PageUp, Message::PageUp)
        .bind(KeyCode::PageDown, Message::PageDown)
        .bind(KeyCode::Home, Message::ScrollTop)
        .bind(KeyCode::End, Message::ScrollBottom)
}

/// Editing keys for the focused input field.
pub fn input_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Left, Message::CursorLeft)
        .bind(KeyCode::Right, Message::CursorRight)
        .bind(KeyCode::Backspace, Message::Backspace)
        .bind(KeyCode::Delete, Message::Delete)
        .bind_ctrl(KeyCode::Char('a'), Message::CursorHome)
        .bind_ctrl(KeyCode::Char('e'), Message::CursorEnd)
        .bind_ctrl(KeyCode::Char('u'), Message::ClearInput)
}

pub fn chat_keymap() -> Keymap {
    input_keymap().extend(scroll_keymap()).extend(global_keymap())
}

pub fn handle_key(key: KeyEvent) -> Option<Message> {
    if let Some(msg) = chat_keymap().get(&key) {
        return Some(msg);
    }

    // Anything else printable is typed into the focused field.
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(Message::Input(c))
        }
        _ => None,
    }
}

pub fn handle_mouse(mouse: MouseEvent) -> Option<Message> {
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(Message::ScrollBy(-WHEEL_ROWS)),
        MouseEventKind::ScrollDown => Some(Message::ScrollBy(WHEEL_ROWS)),
        _ => None,
    }
}

/// One-line key help for the status bar, built from the bindings themselves.
pub fn help_text() -> String {
    let keymap = chat_keymap();
    [
        (Message::FocusNext, "focus"),
        (Message::Submit, "send"),
        (Message::ScrollBottom, "follow"),
        (Message::ToggleDebug, "debug"),
        (Message::Quit, "quit"),
    ]
    .iter()
    .filter_map(|(message, label)| {
        keymap
            .find_key(message)
            .map(|(code, mods)| format!("{}:{label}", format_key(code, mods)))
    })
    .collect::<Vec<_>>()
    .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn make_key(code: KeyCode) -> KeyEvent {
        make_key_with_mods(code, KeyModifiers::empty())
    }

    fn make_key_with_mods(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    fn wheel(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::empty(),
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(handle_key(make_key(KeyCode::Esc)), Some(Message::Quit));
        assert_eq!(
            handle_key(make_key_with_mods(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Message::Quit)
        );
    }

    #[test]
    fn test_letters_are_typed_not_bound() {
        assert_eq!(
            handle_key(make_key(KeyCode::Char('q'))),
            Some(Message::Input('q'))
        );
        assert_eq!(
            handle_key(make_key_with_mods(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(Message::Input('Q'))
        );
        assert_eq!(
            handle_key(make_key(KeyCode::Char('c'))),
            Some(Message::Input('c'))
        );
    }

    #[test]
    fn test_scroll_keys() {
        assert_eq!(handle_key(make_key(KeyCode::Up)), Some(Message::ScrollBy(-1)));
        assert_eq!(handle_key(make_key(KeyCode::Down)), Some(Message::ScrollBy(1)));
        assert_eq!(handle_key(make_key(KeyCode::PageUp)), Some(Message::PageUp));
        assert_eq!(handle_key(make_key(KeyCode::End)), Some(Message::ScrollBottom));
    }

    #[test]
    fn test_editing_keys() {
        assert_eq!(
            handle_key(make_key(KeyCode::Backspace)),
            Some(Message::Backspace)
        );
        assert_eq!(
            handle_key(make_key_with_mods(KeyCode::Char('a'), KeyModifiers::CONTROL)),
            Some(Message::CursorHome)
        );
        assert_eq!(
            handle_key(make_key_with_mods(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            Some(Message::ClearInput)
        );
    }

    #[test]
    fn test_focus_and_submit() {
        assert_eq!(handle_key(make_key(KeyCode::Tab)), Some(Message::FocusNext));
        assert_eq!(
            handle_key(make_key_with_mods(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Message::FocusNext)
        );
        assert_eq!(handle_key(make_key(KeyCode::Enter)), Some(Message::Submit));
    }

    #[test]
    fn test_unbound_control_and_function_keys() {
        assert!(handle_key(make_key(KeyCode::F(12))).is_none());
        assert!(handle_key(make_key_with_mods(KeyCode::Char('x'), KeyModifiers::CONTROL)).is_none());
        assert!(handle_key(make_key_with_mods(KeyCode::Char('x'), KeyModifiers::ALT)).is_none());
    }

    #[test]
    fn test_mouse_wheel_scrolls() {
        assert_eq!(
            handle_mouse(wheel(MouseEventKind::ScrollUp)),
            Some(Message::ScrollBy(-3))
        );
        assert_eq!(
            handle_mouse(wheel(MouseEventKind::ScrollDown)),
            Some(Message::ScrollBy(3))
        );
        assert!(handle_mouse(wheel(MouseEventKind::Moved)).is_none());
    }

    #[test]
    fn test_keymap_extend_precedence() {
        let base = Keymap::new().bind(KeyCode::Char('x'), Message::Quit);
        let extended = base.extend(Keymap::new().bind(KeyCode::Char('x'), Message::ToggleDebug));

        assert_eq!(
            extended.get(&make_key(KeyCode::Char('x'))),
            Some(Message::ToggleDebug)
        );
    }

    #[test]
    fn test_help_text() {
        insta::assert_snapshot!(help_text(), @"Tab:focus  Enter:send  End:follow  F2:debug  Esc:quit");
    }
}
