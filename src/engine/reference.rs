use std::ops::Range;

use crate::engine::entities::decode_html_entities;

/// The fixed text a session asks the user to reproduce.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceText {
    chars: Vec<char>,
}

impl ReferenceText {
    /// CRLF line endings are folded to `\n`, the only newline Enter produces.
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.replace("\r\n", "\n").chars().collect(),
        }
    }

    /// Build from content as served by the practice API (entity-encoded).
    pub fn from_encoded(content: &str) -> Self {
        Self::new(&decode_html_entities(content))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    /// Clamped to the text bounds.
    pub fn slice(&self, range: Range<usize>) -> &[char] {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        &self.chars[start..end]
    }

    pub fn peek(&self, from: usize, n: usize) -> String {
        self.slice(from..from.saturating_add(n)).iter().collect()
    }

    pub fn line_count(&self) -> usize {
        self.chars.iter().filter(|&&c| c == '\n').count() + 1
    }
}
