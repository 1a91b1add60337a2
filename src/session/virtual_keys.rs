use crate::engine::InputEvent;

const DEFAULT_ROWS: &[&[&str]] = &[
    &["`", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "{bksp}"],
    &["{tab}", "q", "w", "e", "r", "t", "y", "u", "i", "o", "p", "[", "]", "\\"],
    &["{lock}", "a", "s", "d", "f", "g", "h", "j", "k", "l", ";", "'", "{enter}"],
    &["{shift}", "z", "x", "c", "v", "b", "n", "m", ",", ".", "/", "{shift}"],
    &["{space}"],
];

const SHIFT_ROWS: &[&[&str]] = &[
    &["~", "!", "@", "#", "$", "%", "^", "&", "*", "(", ")", "_", "+", "{bksp}"],
    &["{tab}", "Q", "W", "E", "R", "T", "Y", "U", "I", "O", "P", "{", "}", "|"],
    &["{lock}", "A", "S", "D", "F", "G", "H", "J", "K", "L", ":", "\"", "{enter}"],
    &["{shift}", "Z", "X", "C", "V", "B", "N", "M", "<", ">", "?", "{shift}"],
    &["{space}"],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VirtualKey {
    Char(char),
    Space,
    Backspace,
    Tab,
    Enter,
    Shift,
    Lock,
}

impl VirtualKey {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "{bksp}" => Some(VirtualKey::Backspace),
            "{tab}" => Some(VirtualKey::Tab),
            "{enter}" => Some(VirtualKey::Enter),
            "{space}" => Some(VirtualKey::Space),
            "{shift}" => Some(VirtualKey::Shift),
            "{lock}" => Some(VirtualKey::Lock),
            _ => {
                let mut chars = label.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(VirtualKey::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

/// Text shown on a button.
pub fn display_label(label: &str) -> &str {
    match label {
        "{bksp}" => "\u{232b}",
        "{tab}" => "tab",
        "{enter}" => "enter",
        "{space}" => "space",
        "{shift}" => "shift",
        "{lock}" => "caps",
        other => other,
    }
}

/// On-screen keyboard: layer state plus label to input translation.
#[derive(Clone, Debug, Default)]
pub struct VirtualKeyboard {
    shift_once: bool,
    caps_lock: bool,
}

impl VirtualKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shifted(&self) -> bool {
        self.shift_once ^ self.caps_lock
    }

    pub fn rows(&self) -> &'static [&'static [&'static str]] {
        if self.is_shifted() {
            SHIFT_ROWS
        } else {
            DEFAULT_ROWS
        }
    }

    /// Translate a pressed button into the shared input stream.
    /// Layer keys only change the keyboard and yield nothing.
    pub fn press(&mut self, label: &str) -> Option<InputEvent> {
        let key = VirtualKey::parse(label)?;
        let event = match key {
            VirtualKey::Shift => {
                self.shift_once = !self.shift_once;
                return None;
            }
            VirtualKey::Lock => {
                self.caps_lock = !self.caps_lock;
                return None;
            }
            VirtualKey::Backspace => InputEvent::Backspace,
            VirtualKey::Tab => InputEvent::Tab,
            VirtualKey::Enter => InputEvent::Enter,
            VirtualKey::Space => InputEvent::Char(' '),
            VirtualKey::Char(c) => InputEvent::from_char(c),
        };
        if matches!(key, VirtualKey::Char(_)) {
            self.shift_once = false;
        }
        Some(event)
    }

    /// The button that produces `ch`, and whether it sits on the shifted layer.
    pub fn button_for(ch: char) -> Option<(&'static str, bool)> {
        match ch {
            ' ' => return Some(("{space}", false)),
            '\n' => return Some(("{enter}", false)),
            '\t' => return Some(("{tab}", false)),
            _ => {}
        }
        let find = |rows: &'static [&'static [&'static str]]| {
            rows.iter()
                .flat_map(|row| row.iter())
                .find(|label| VirtualKey::parse(label) == Some(VirtualKey::Char(ch)))
                .copied()
        };
        find(DEFAULT_ROWS)
            .map(|l| (l, false))
            .or_else(|| find(SHIFT_ROWS).map(|l| (l, true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_buttons_unify_with_physical_keys() {
        let mut kb = VirtualKeyboard::new();
        assert_eq!(kb.press("{enter}"), Some(InputEvent::Enter));
        assert_eq!(kb.press("{tab}"), Some(InputEvent::Tab));
        assert_eq!(kb.press("{bksp}"), Some(InputEvent::Backspace));
        assert_eq!(kb.press("{space}"), Some(InputEvent::Char(' ')));
        assert_eq!(kb.press("q"), Some(InputEvent::Char('q')));
    }

    #[test]
    fn test_unknown_labels_are_ignored() {
        let mut kb = VirtualKeyboard::new();
        assert_eq!(kb.press(".com"), None);
        assert_eq!(kb.press("{alt}"), None);
        assert_eq!(kb.press(""), None);
    }

    #[test]
    fn test_shift_is_one_shot() {
        let mut kb = VirtualKeyboard::new();
        assert_eq!(kb.press("{shift}"), None);
        assert!(kb.is_shifted());
        assert_eq!(kb.rows()[1][1], "Q");
        assert_eq!(kb.press("Q"), Some(InputEvent::Char('Q')));
        assert!(!kb.is_shifted());
    }

    #[test]
    fn test_caps_lock_persists() {
        let mut kb = VirtualKeyboard::new();
        kb.press("{lock}");
        kb.press("A");
        assert!(kb.is_shifted());
        kb.press("{lock}");
        assert!(!kb.is_shifted());
    }

    #[test]
    fn test_button_for() {
        assert_eq!(VirtualKeyboard::button_for('a'), Some(("a", false)));
        assert_eq!(VirtualKeyboard::button_for('{'), Some(("{", true)));
        assert_eq!(VirtualKeyboard::button_for('\n'), Some(("{enter}", false)));
        assert_eq!(VirtualKeyboard::button_for('é'), None);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(display_label("{space}"), "space");
        assert_eq!(display_label("x"), "x");
    }
}
