use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::api::Direction;
use crate::engine::InputEvent;

pub enum AppEvent {
    Key(KeyEvent),
    /// Left click at (column, row).
    Click(u16, u16),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
}

/// What a physical key press means to the app.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Input(InputEvent),
    Navigate(Direction),
    Quit,
}

/// Map a terminal key event. Releases and repeats are dropped so held keys
/// don't inflate keystroke counts.
pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(KeyAction::Quit),
            KeyCode::Char('n') => Some(KeyAction::Navigate(Direction::Next)),
            KeyCode::Char('p') => Some(KeyAction::Navigate(Direction::Previous)),
            _ => None,
        };
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }
    let input = match key.code {
        KeyCode::Esc | KeyCode::F(2) => InputEvent::ToggleKeyboard,
        KeyCode::Backspace => InputEvent::Backspace,
        KeyCode::Tab => InputEvent::Tab,
        KeyCode::Enter => InputEvent::Enter,
        KeyCode::Char(ch) => InputEvent::from_char(ch),
        _ => return None,
    };
    Some(KeyAction::Input(input))
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _tx: mpsc::Sender<AppEvent>,
}

fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) => Some(AppEvent::Key(key)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => Some(AppEvent::Click(column, row)),
        _ => None,
    }
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let _tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(ev) = event::read()
                        && let Some(app_event) = translate(ev)
                        && tx.send(app_event).is_err()
                    {
                        return;
                    }
                } else if tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, _tx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
