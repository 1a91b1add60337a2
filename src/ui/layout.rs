use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Rows needed for the on-screen keyboard: five key rows plus borders.
pub const KEYBOARD_HEIGHT: u16 = 7;
const STATUS_HEIGHT: u16 = 4;

pub struct AppLayout {
    pub header: Rect,
    pub code: Rect,
    pub status: Rect,
    pub keyboard: Option<Rect>,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect, show_keyboard: bool) -> Self {
        // The keyboard gives way before the code view does.
        let keyboard_fits = show_keyboard && area.height >= 3 + 6 + STATUS_HEIGHT + KEYBOARD_HEIGHT + 3;
        let keyboard_height = if keyboard_fits { KEYBOARD_HEIGHT } else { 0 };

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(STATUS_HEIGHT),
                Constraint::Length(keyboard_height),
                Constraint::Length(3),
            ])
            .split(area);

        Self {
            header: vertical[0],
            code: vertical[1],
            status: vertical[2],
            keyboard: keyboard_fits.then_some(vertical[3]),
            footer: vertical[4],
        }
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = "  ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let target_w = width.min(area.width);
    let target_h = height.min(area.height);
    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);
    Rect::new(left, top, target_w, target_h)
}
