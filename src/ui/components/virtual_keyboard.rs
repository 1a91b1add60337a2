use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use crate::session::virtual_keys::{VirtualKeyboard, display_label};
use crate::ui::theme::Theme;

const SPACE_WIDTH: u16 = 30;

/// A placed button: its screen rectangle and the layout label it sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRect {
    pub rect: Rect,
    pub label: &'static str,
}

fn button_width(label: &str) -> u16 {
    if label == "{space}" {
        return SPACE_WIDTH;
    }
    display_label(label).chars().count() as u16 + 2
}

fn inner_area(area: Rect) -> Rect {
    Block::bordered().inner(area)
}

/// Button positions for the keyboard's current layer inside `area`.
/// Rows are centered; buttons that do not fit are dropped.
pub fn key_rects(keyboard: &VirtualKeyboard, area: Rect) -> Vec<KeyRect> {
    let inner = inner_area(area);
    let mut out = Vec::new();

    for (row_idx, row) in keyboard.rows().iter().enumerate() {
        let y = inner.y + row_idx as u16;
        if y >= inner.y + inner.height {
            break;
        }
        let row_width: u16 = row.iter().map(|l| button_width(l) + 1).sum::<u16>().saturating_sub(1);
        let mut x = inner.x + inner.width.saturating_sub(row_width) / 2;

        for &label in row.iter() {
            let width = button_width(label);
            if x + width > inner.x + inner.width {
                break;
            }
            out.push(KeyRect {
                rect: Rect::new(x, y, width, 1),
                label,
            });
            x += width + 1;
        }
    }
    out
}

/// Label of the button under a click, if any.
pub fn hit_test(keyboard: &VirtualKeyboard, area: Rect, column: u16, row: u16) -> Option<&'static str> {
    key_rects(keyboard, area)
        .into_iter()
        .find(|k| {
            row == k.rect.y && column >= k.rect.x && column < k.rect.x + k.rect.width
        })
        .map(|k| k.label)
}

pub struct VirtualKeyboardView<'a> {
    keyboard: &'a VirtualKeyboard,
    next_char: Option<char>,
    theme: &'a Theme,
}

impl<'a> VirtualKeyboardView<'a> {
    pub fn new(keyboard: &'a VirtualKeyboard, next_char: Option<char>, theme: &'a Theme) -> Self {
        Self {
            keyboard,
            next_char,
            theme,
        }
    }
}

impl Widget for VirtualKeyboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Keyboard ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        block.render(area, buf);

        let target = self.next_char.and_then(VirtualKeyboard::button_for);
        let needs_shift = target.is_some_and(|(_, shifted)| shifted != self.keyboard.is_shifted());

        for key in key_rects(self.keyboard, area) {
            let is_next = target.is_some_and(|(label, _)| label == key.label) && !needs_shift;
            let is_shift_hint = needs_shift && key.label == "{shift}";
            let is_active_layer = key.label == "{shift}" && self.keyboard.is_shifted();

            let style = if is_next || is_shift_hint {
                Style::default()
                    .fg(colors.bg())
                    .bg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else if is_active_layer {
                Style::default().fg(colors.bg()).bg(colors.focused_key())
            } else {
                Style::default().fg(colors.fg()).bg(colors.header_bg())
            };

            let text = format!(
                "{:^width$}",
                display_label(key.label),
                width = key.rect.width as usize
            );
            buf.set_string(key.rect.x, key.rect.y, &text, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Rect {
        Rect::new(0, 10, 100, 7)
    }

    #[test]
    fn test_rects_stay_inside_area() {
        let kb = VirtualKeyboard::new();
        let rects = key_rects(&kb, area());
        assert!(!rects.is_empty());
        for k in &rects {
            assert!(k.rect.x >= 1 && k.rect.x + k.rect.width <= 99);
            assert!(k.rect.y >= 11 && k.rect.y < 16);
        }
        assert!(rects.iter().any(|k| k.label == "{space}"));
    }

    #[test]
    fn test_hit_test_finds_button() {
        let kb = VirtualKeyboard::new();
        let q = key_rects(&kb, area())
            .into_iter()
            .find(|k| k.label == "q")
            .unwrap();
        assert_eq!(hit_test(&kb, area(), q.rect.x + 1, q.rect.y), Some("q"));
        assert_eq!(hit_test(&kb, area(), 0, 0), None);
    }

    #[test]
    fn test_hit_test_follows_shift_layer() {
        let mut kb = VirtualKeyboard::new();
        kb.press("{shift}");
        let q = key_rects(&kb, area())
            .into_iter()
            .find(|k| k.label == "Q")
            .unwrap();
        assert_eq!(hit_test(&kb, area(), q.rect.x, q.rect.y), Some("Q"));
    }

    #[test]
    fn test_narrow_area_drops_buttons() {
        let kb = VirtualKeyboard::new();
        let rects = key_rects(&kb, Rect::new(0, 0, 20, 7));
        assert!(rects.iter().all(|k| k.rect.x + k.rect.width <= 19));
    }
}
