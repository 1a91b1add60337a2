use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::typing::{TypingSession, key_name};
use crate::ui::layout::pack_hint_lines;
use crate::ui::theme::Theme;

const KEY_HELP: &[&str] = &[
    "[Tab] Hint",
    "[Esc] Keyboard",
    "[Ctrl+N] Next",
    "[Ctrl+P] Previous",
    "[Ctrl+Q] Quit",
];

/// Feedback line for the current keystroke plus key help.
pub struct StatusPanel<'a> {
    session: &'a TypingSession,
    now: Instant,
    in_project: bool,
    theme: &'a Theme,
}

impl<'a> StatusPanel<'a> {
    pub fn new(session: &'a TypingSession, now: Instant, in_project: bool, theme: &'a Theme) -> Self {
        Self {
            session,
            now,
            in_project,
            theme,
        }
    }

    fn feedback(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let session = self.session;

        if session.is_empty() {
            return Line::from(Span::styled(
                "No content to type.",
                Style::default().fg(colors.warning()),
            ));
        }
        if session.is_complete() {
            let message = if self.in_project {
                "Completed. Ctrl+N opens the next file."
            } else {
                "Completed. Ctrl+Q to exit."
            };
            return Line::from(Span::styled(
                message,
                Style::default()
                    .fg(colors.success())
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if let Some(mismatch) = session.mismatch {
            return Line::from(Span::styled(
                format!(
                    "Expected '{}' but got '{}'",
                    key_name(mismatch.expected),
                    key_name(mismatch.typed)
                ),
                Style::default().fg(colors.error()),
            ));
        }
        if session.hint_visible(self.now) {
            return Line::from(vec![
                Span::styled("Next: ", Style::default().fg(colors.fg())),
                Span::styled(
                    session.hint_text(),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
            ]);
        }
        Line::from(Span::styled(
            session.state().pending_text(),
            Style::default().fg(colors.text_typing()),
        ))
    }
}

impl Widget for StatusPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);

        let help: Vec<&str> = KEY_HELP
            .iter()
            .copied()
            .filter(|h| self.in_project || !(h.contains("Next") || h.contains("Previous")))
            .collect();

        let mut lines = vec![self.feedback()];
        lines.extend(
            pack_hint_lines(&help, inner.width as usize)
                .into_iter()
                .map(|l| Line::from(Span::styled(l, Style::default().fg(colors.text_pending())))),
        );

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
