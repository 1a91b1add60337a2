use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::MatchState;
use crate::engine::ReferenceText;
use crate::ui::theme::{Theme, ThemeColors};

pub struct CodeView<'a> {
    reference: &'a ReferenceText,
    state: &'a MatchState,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> CodeView<'a> {
    pub fn new(
        reference: &'a ReferenceText,
        state: &'a MatchState,
        title: &'a str,
        theme: &'a Theme,
    ) -> Self {
        Self {
            reference,
            state,
            title,
            theme,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharClass {
    Confirmed,
    Pending,
    Error,
    Cursor,
    Untyped,
}

fn classify(idx: usize, state: &MatchState) -> CharClass {
    let position = state.position();
    if idx < state.cursor {
        CharClass::Confirmed
    } else if idx < position {
        CharClass::Pending
    } else if idx == position && state.error_mark.is_some() && !state.completed {
        CharClass::Error
    } else if idx == position && !state.completed {
        CharClass::Cursor
    } else {
        CharClass::Untyped
    }
}

fn class_style(class: CharClass, colors: &ThemeColors) -> Style {
    match class {
        CharClass::Confirmed => Style::default()
            .fg(colors.text_correct())
            .bg(colors.text_correct_bg()),
        CharClass::Pending => Style::default().fg(colors.text_typing()),
        CharClass::Error => Style::default()
            .fg(colors.text_incorrect())
            .bg(colors.text_incorrect_bg())
            .add_modifier(Modifier::UNDERLINED),
        CharClass::Cursor => Style::default()
            .fg(colors.text_cursor_fg())
            .bg(colors.text_cursor_bg()),
        CharClass::Untyped => Style::default().fg(colors.text_pending()),
    }
}

/// A render token maps a single reference character to its display representation.
struct RenderToken {
    idx: usize,
    display: String,
    is_line_break: bool,
}

fn build_render_tokens(chars: &[char]) -> Vec<RenderToken> {
    let mut tokens = Vec::with_capacity(chars.len());
    let mut col = 0usize;

    for (idx, &ch) in chars.iter().enumerate() {
        let (display, is_line_break) = match ch {
            '\n' => {
                col = 0;
                ("\u{21b5}".to_string(), true)
            }
            '\t' => {
                let tab_width = 4 - (col % 4);
                col += tab_width;
                let mut display = String::from("\u{2192}");
                display.extend(std::iter::repeat_n('\u{00b7}', tab_width - 1));
                (display, false)
            }
            _ => {
                col += 1;
                (ch.to_string(), false)
            }
        };
        tokens.push(RenderToken {
            idx,
            display,
            is_line_break,
        });
    }

    tokens
}

/// Zero-based line holding `idx`.
fn line_of(chars: &[char], idx: usize) -> usize {
    chars[..idx.min(chars.len())]
        .iter()
        .filter(|&&c| c == '\n')
        .count()
}

/// First visible line so the cursor line sits in the upper third of the view.
fn scroll_offset(cursor_line: usize, total_lines: usize, height: usize) -> usize {
    if height == 0 || total_lines <= height {
        return 0;
    }
    let lead = height / 3;
    cursor_line
        .saturating_sub(lead)
        .min(total_lines.saturating_sub(height))
}

impl Widget for CodeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let chars = self.reference.as_slice();
        let total_lines = self.reference.line_count();
        let gutter = total_lines.to_string().len();

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];
        for token in build_render_tokens(chars) {
            let style = class_style(classify(token.idx, self.state), colors);
            if let Some(line) = lines.last_mut() {
                line.push(Span::styled(token.display, style));
            }
            if token.is_line_break {
                lines.push(Vec::new());
            }
        }

        // Cursor past the last char (trailing newline) still needs a visible block.
        if !self.state.completed
            && !chars.is_empty()
            && self.state.position() >= chars.len()
            && let Some(line) = lines.last_mut()
        {
            line.push(Span::styled(" ", class_style(CharClass::Cursor, colors)));
        }

        let gutter_style = Style::default().fg(colors.line_number());
        let rendered: Vec<Line> = lines
            .into_iter()
            .enumerate()
            .map(|(n, spans)| {
                let mut row = Vec::with_capacity(spans.len() + 1);
                row.push(Span::styled(format!("{:>gutter$} ", n + 1), gutter_style));
                row.extend(spans);
                Line::from(row)
            })
            .collect();

        let cursor_line = line_of(chars, self.state.position());
        let offset = scroll_offset(cursor_line, rendered.len(), inner.height as usize);

        Paragraph::new(rendered)
            .block(block)
            .scroll((offset.min(u16::MAX as usize) as u16, 0))
            .render(area, buf);
    }
}
