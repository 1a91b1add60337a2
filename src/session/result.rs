use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::typing::TypingSession;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub file_name: String,
    pub elapsed_secs: u64,
    pub total_chars: usize,
    pub keystrokes: usize,
    pub mistakes: usize,
    pub accuracy: f64,
    pub cpm: f64,
    pub finished_at: DateTime<Utc>,
}

impl CompletionSummary {
    pub fn from_session(session: &TypingSession, now: Instant) -> Self {
        let elapsed_secs = session.elapsed_secs(now);
        let total_chars = session.reference().len();
        // Chars typed this sitting, not counting what was resumed or auto-skipped.
        let typed = session.keystrokes.saturating_sub(session.mistakes);
        let cpm = if elapsed_secs == 0 {
            0.0
        } else {
            typed as f64 / (elapsed_secs as f64 / 60.0)
        };
        Self {
            file_name: session.source.file_name.clone(),
            elapsed_secs,
            total_chars,
            keystrokes: session.keystrokes,
            mistakes: session.mistakes,
            accuracy: session.accuracy(),
            cpm,
            finished_at: Utc::now(),
        }
    }

    pub fn wpm(&self) -> f64 {
        self.cpm / 5.0
    }
}
