use std::time::{Duration, Instant};

use crate::engine::{InputEvent, MatchEngine, MatchRules, MatchState, Outcome, ReferenceText};
use crate::store::{ProgressRecord, ProgressUpdate, ResourceId};

const HINT_LEN: usize = 5;

/// Where the reference text came from.
#[derive(Clone, Debug)]
pub struct SessionSource {
    pub resource: ResourceId,
    pub file_name: String,
    pub description: String,
    pub language: String,
}

/// Last rejected keystroke, for the error panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: char,
    pub typed: char,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStep {
    pub outcome: Outcome,
    /// Confirmed progress moved; the synchronizer should be told.
    pub dirty: bool,
    /// This step finished the text.
    pub just_completed: bool,
}

impl SessionStep {
    fn ignored() -> Self {
        Self {
            outcome: Outcome::Ignored,
            dirty: false,
            just_completed: false,
        }
    }
}

pub struct TypingSession {
    pub source: SessionSource,
    engine: MatchEngine,
    state: MatchState,
    hint_window: Duration,
    hint_until: Option<Instant>,
    pub show_keyboard: bool,
    pub mismatch: Option<Mismatch>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub keystrokes: usize,
    pub mistakes: usize,
}

impl TypingSession {
    pub fn new(
        source: SessionSource,
        reference: ReferenceText,
        rules: MatchRules,
        progress: Option<&ProgressRecord>,
        hint_window: Duration,
        now: Instant,
    ) -> Self {
        let state = match progress {
            Some(record) => MatchState::resume(
                reference.len(),
                record.current_token_index,
                record.is_completed,
            ),
            None => MatchState::new(),
        };
        // The timer only runs for content that still has something to type.
        let started_at = (!reference.is_empty() && !state.completed).then_some(now);
        Self {
            source,
            engine: MatchEngine::new(reference, rules),
            state,
            hint_window,
            hint_until: None,
            show_keyboard: false,
            mismatch: None,
            started_at,
            finished_at: None,
            keystrokes: 0,
            mistakes: 0,
        }
    }

    pub fn reference(&self) -> &ReferenceText {
        self.engine.reference()
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Nothing to type: content missing or still loading.
    pub fn is_empty(&self) -> bool {
        self.engine.reference().is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.state.completed
    }

    pub fn expected(&self) -> Option<char> {
        self.engine.expected(&self.state)
    }

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> SessionStep {
        if self.is_empty() {
            return SessionStep::ignored();
        }
        if event == InputEvent::ToggleKeyboard {
            self.show_keyboard = !self.show_keyboard;
            return SessionStep {
                outcome: Outcome::KeyboardToggled,
                dirty: false,
                just_completed: false,
            };
        }

        let was_complete = self.state.completed;
        let step = self.engine.apply(&self.state, event);
        let dirty = step.is_dirty();

        match step.outcome {
            Outcome::Accepted { .. } => {
                self.mismatch = None;
                if event != InputEvent::Backspace {
                    self.keystrokes += 1;
                }
            }
            Outcome::Rejected { expected, typed } => {
                self.mismatch = Some(Mismatch { expected, typed });
                self.keystrokes += 1;
                self.mistakes += 1;
            }
            Outcome::HintRequested => self.hint_until = Some(now + self.hint_window),
            Outcome::KeyboardToggled | Outcome::Ignored => {}
        }

        self.state = step.state;
        let just_completed = !was_complete && self.state.completed;
        if just_completed {
            self.finished_at = Some(now);
        }
        SessionStep {
            outcome: step.outcome,
            dirty,
            just_completed,
        }
    }

    pub fn hint_visible(&self, now: Instant) -> bool {
        self.hint_until.is_some_and(|until| now < until)
    }

    /// The next few expected characters with whitespace made visible.
    pub fn hint_text(&self) -> String {
        if self.state.completed {
            return String::new();
        }
        self.reference()
            .peek(self.state.position(), HINT_LEN)
            .replace(' ', "\u{2423}")
            .replace('\n', "\u{21b5}")
    }

    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            current_token_index: self.state.cursor,
            is_completed: self.state.completed,
        }
    }

    pub fn progress_ratio(&self) -> f64 {
        let len = self.reference().len();
        if len == 0 {
            return 0.0;
        }
        (self.state.cursor as f64 / len as f64).clamp(0.0, 1.0)
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start).as_secs(),
            (Some(start), None) => now.saturating_duration_since(start).as_secs(),
            _ => 0,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.keystrokes == 0 {
            return 100.0;
        }
        ((self.keystrokes - self.mistakes) as f64 / self.keystrokes as f64 * 100.0)
            .clamp(0.0, 100.0)
    }
}

/// `m:ss`, as shown in the header and the completion panel.
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Human name for a character in the error panel.
pub fn key_name(ch: char) -> String {
    match ch {
        ' ' => "Space".to_string(),
        '\n' => "Enter".to_string(),
        '\t' => "Tab".to_string(),
        c => c.to_string(),
    }
}
