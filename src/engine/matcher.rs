use tracing::trace;

use crate::engine::reference::ReferenceText;

/// One user input, from either the physical or the on-screen keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Backspace,
    Tab,
    Enter,
    /// Shows or hides the on-screen keyboard. Never touches match state.
    ToggleKeyboard,
}

impl InputEvent {
    pub fn from_char(ch: char) -> Self {
        match ch {
            '\n' => InputEvent::Enter,
            '\t' => InputEvent::Tab,
            c => InputEvent::Char(c),
        }
    }

    /// The character this event would put into the text, if any.
    pub fn produced_char(self) -> Option<char> {
        match self {
            InputEvent::Char(c) => Some(c),
            InputEvent::Tab => Some('\t'),
            InputEvent::Enter => Some('\n'),
            InputEvent::Backspace | InputEvent::ToggleKeyboard => None,
        }
    }
}

/// Checkpoint granularity: when pending input is committed into the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchRules {
    pub advance_chars: Vec<char>,
    pub max_pending: usize,
}

pub const DEFAULT_ADVANCE_CHARS: &[char] = &[' ', '.', ';', ','];
pub const DEFAULT_MAX_PENDING: usize = 10;

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            advance_chars: DEFAULT_ADVANCE_CHARS.to_vec(),
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl MatchRules {
    fn forces_advance(&self, typed: char, pending_len: usize) -> bool {
        self.advance_chars.contains(&typed) || pending_len >= self.max_pending
    }
}

/// Matcher position within a reference text.
///
/// `reference[cursor..cursor + pending.len()] == pending` holds for every
/// state the engine produces; rejected characters only set `error_mark`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchState {
    /// Confirmed progress. Never decreases.
    pub cursor: usize,
    /// Correct-so-far input since the last advance.
    pub pending: Vec<char>,
    /// Offset within `pending` where the last rejected character would have gone.
    pub error_mark: Option<usize>,
    pub completed: bool,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a persisted progress record.
    pub fn resume(reference_len: usize, current_token_index: usize, is_completed: bool) -> Self {
        let cursor = current_token_index.min(reference_len);
        Self {
            cursor,
            pending: Vec::new(),
            error_mark: None,
            completed: is_completed || (reference_len > 0 && cursor >= reference_len),
        }
    }

    /// Index of the next expected character.
    pub fn position(&self) -> usize {
        self.cursor + self.pending.len()
    }

    pub fn pending_text(&self) -> String {
        self.pending.iter().collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted { advanced: bool },
    Rejected { expected: char, typed: char },
    /// Tab pressed where no tab is expected.
    HintRequested,
    KeyboardToggled,
    Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub state: MatchState,
    pub outcome: Outcome,
}

impl Step {
    /// True when confirmed progress moved and should be synced.
    pub fn is_dirty(&self) -> bool {
        matches!(self.outcome, Outcome::Accepted { advanced: true })
    }
}

pub struct MatchEngine {
    reference: ReferenceText,
    rules: MatchRules,
}

impl MatchEngine {
    pub fn new(reference: ReferenceText, rules: MatchRules) -> Self {
        Self { reference, rules }
    }

    pub fn reference(&self) -> &ReferenceText {
        &self.reference
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn expected(&self, state: &MatchState) -> Option<char> {
        if state.completed {
            return None;
        }
        self.reference.get(state.position())
    }

    pub fn is_consistent(&self, state: &MatchState) -> bool {
        let end = state.position();
        end <= self.reference.len()
            && self.reference.slice(state.cursor..end) == state.pending.as_slice()
    }

    pub fn apply(&self, state: &MatchState, event: InputEvent) -> Step {
        let mut next = state.clone();
        let outcome = match event {
            InputEvent::ToggleKeyboard => Outcome::KeyboardToggled,
            InputEvent::Backspace => Self::backspace(&mut next),
            InputEvent::Tab | InputEvent::Char('\t') => self.tab(&mut next),
            InputEvent::Enter | InputEvent::Char('\n') => self.enter(&mut next),
            InputEvent::Char(c) => self.char(&mut next, c),
        };
        debug_assert!(self.is_consistent(&next));
        trace!(?event, ?outcome, cursor = next.cursor, pending = next.pending.len(), "match step");
        Step {
            state: next,
            outcome,
        }
    }

    fn backspace(state: &mut MatchState) -> Outcome {
        if state.pending.pop().is_some() {
            state.error_mark = None;
            Outcome::Accepted { advanced: false }
        } else {
            Outcome::Ignored
        }
    }

    fn tab(&self, state: &mut MatchState) -> Outcome {
        let Some(expected) = self.expected(state) else {
            return Outcome::Ignored;
        };
        if expected != '\t' {
            return Outcome::HintRequested;
        }
        state.pending.push('\t');
        state.error_mark = None;
        self.commit(state, false);
        Outcome::Accepted { advanced: true }
    }

    fn enter(&self, state: &mut MatchState) -> Outcome {
        let Some(expected) = self.expected(state) else {
            return Outcome::Ignored;
        };
        if expected != '\n' {
            return Self::reject(state, expected, '\n');
        }
        state.pending.push('\n');
        state.error_mark = None;
        self.commit(state, true);
        Outcome::Accepted { advanced: true }
    }

    fn char(&self, state: &mut MatchState, typed: char) -> Outcome {
        let Some(expected) = self.expected(state) else {
            return Outcome::Ignored;
        };
        if typed != expected {
            return Self::reject(state, expected, typed);
        }
        state.pending.push(typed);
        state.error_mark = None;

        let at_end = state.position() >= self.reference.len();
        if self.rules.forces_advance(typed, state.pending.len()) || at_end {
            self.commit(state, typed == ' ');
            Outcome::Accepted { advanced: true }
        } else {
            Outcome::Accepted { advanced: false }
        }
    }

    fn reject(state: &mut MatchState, expected: char, typed: char) -> Outcome {
        state.error_mark = Some(state.pending.len());
        Outcome::Rejected { expected, typed }
    }

    /// Move pending input into the cursor, optionally swallowing the run of
    /// spaces that follows (indentation after a newline, alignment after a space).
    fn commit(&self, state: &mut MatchState, skip_spaces: bool) {
        state.cursor += state.pending.len();
        state.pending.clear();
        if skip_spaces {
            while self.reference.get(state.cursor) == Some(' ') {
                state.cursor += 1;
            }
        }
        if state.cursor >= self.reference.len() {
            state.completed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(text: &str) -> MatchEngine {
        MatchEngine::new(ReferenceText::new(text), MatchRules::default())
    }

    fn type_all(engine: &MatchEngine, state: MatchState, events: &[InputEvent]) -> MatchState {
        events
            .iter()
            .fold(state, |s, &ev| engine.apply(&s, ev).state)
    }

    fn chars(s: &str) -> Vec<InputEvent> {
        s.chars().map(InputEvent::from_char).collect()
    }

    #[test]
    fn test_space_forces_advance() {
        let e = engine("ab cd");
        let state = type_all(&e, MatchState::new(), &chars("ab "));
        assert_eq!(state.cursor, 3);
        assert!(state.pending.is_empty());
        assert!(!state.completed);
    }

    #[test]
    fn test_enter_skips_indentation() {
        let e = engine("x\n   y");
        let step = e.apply(&MatchState::new(), InputEvent::Char('x'));
        assert_eq!(step.outcome, Outcome::Accepted { advanced: false });
        let step = e.apply(&step.state, InputEvent::Enter);
        assert!(step.is_dirty());
        assert_eq!(step.state.cursor, 5);
        assert_eq!(e.expected(&step.state), Some('y'));
    }

    #[test]
    fn test_mismatch_sets_error_mark_only() {
        let e = engine("abc");
        let step = e.apply(&MatchState::new(), InputEvent::Char('z'));
        assert_eq!(
            step.outcome,
            Outcome::Rejected {
                expected: 'a',
                typed: 'z'
            }
        );
        assert_eq!(step.state.error_mark, Some(0));
        assert_eq!(step.state.cursor, 0);
        assert!(step.state.pending.is_empty());
        assert!(!step.is_dirty());
    }

    #[test]
    fn test_error_mark_points_into_pending() {
        let e = engine("abcdef");
        let state = type_all(&e, MatchState::new(), &chars("abX"));
        assert_eq!(state.pending, vec!['a', 'b']);
        assert_eq!(state.error_mark, Some(2));

        let state = e.apply(&state, InputEvent::Char('c')).state;
        assert_eq!(state.error_mark, None);
        assert_eq!(state.pending_text(), "abc");
    }

    #[test]
    fn test_completed_ignores_further_chars() {
        let e = engine("ab;cd");
        let done = MatchState::resume(5, 5, false);
        assert!(done.completed);
        let step = e.apply(&done, InputEvent::Char('x'));
        assert_eq!(step.outcome, Outcome::Ignored);
        assert_eq!(step.state, done);
    }

    #[test]
    fn test_typing_to_the_end_completes() {
        let e = engine("ab;cd");
        let state = type_all(&e, MatchState::new(), &chars("ab;cd"));
        assert_eq!(state.cursor, 5);
        assert!(state.completed);
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_tenth_char_forces_advance() {
        let e = engine("abcdefghijklmnop");
        let state = type_all(&e, MatchState::new(), &chars("abcdefghi"));
        assert_eq!(state.cursor, 0);
        assert_eq!(state.pending.len(), 9);

        let step = e.apply(&state, InputEvent::Char('j'));
        assert!(step.is_dirty());
        assert_eq!(step.state.cursor, 10);
        assert!(step.state.pending.is_empty());
    }

    #[test]
    fn test_punctuation_forces_advance() {
        for (text, typed) in [("a.b", "a."), ("a;b", "a;"), ("a,b", "a,")] {
            let e = engine(text);
            let state = type_all(&e, MatchState::new(), &chars(typed));
            assert_eq!(state.cursor, 2, "text {text:?}");
        }
    }

    #[test]
    fn test_custom_rules() {
        let rules = MatchRules {
            advance_chars: vec!['('],
            max_pending: 3,
        };
        let e = MatchEngine::new(ReferenceText::new("f(x) y.z"), rules);
        let state = type_all(&e, MatchState::new(), &chars("f("));
        assert_eq!(state.cursor, 2);
        let state = type_all(&e, state, &chars("x) "));
        assert_eq!(state.cursor, 5);
        let state = e.apply(&state, InputEvent::Char('y')).state;
        let state = e.apply(&state, InputEvent::Char('.')).state;
        assert_eq!(state.cursor, 5);
        assert_eq!(state.pending_text(), "y.");
    }

    #[test]
    fn test_backspace_only_reverts_pending() {
        let e = engine("ab cd");
        let state = type_all(&e, MatchState::new(), &chars("ab c"));
        assert_eq!(state.cursor, 3);
        assert_eq!(state.pending_text(), "c");

        let state = e.apply(&state, InputEvent::Backspace).state;
        assert_eq!(state.cursor, 3);
        assert!(state.pending.is_empty());

        let step = e.apply(&state, InputEvent::Backspace);
        assert_eq!(step.outcome, Outcome::Ignored);
        assert_eq!(step.state.cursor, 3);
    }

    #[test]
    fn test_backspace_clears_error() {
        let e = engine("abc");
        let state = type_all(&e, MatchState::new(), &chars("aX"));
        assert_eq!(state.error_mark, Some(1));
        let state = e.apply(&state, InputEvent::Backspace).state;
        assert_eq!(state.error_mark, None);
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_tab_advances_immediately() {
        let e = engine("\tlet x");
        let step = e.apply(&MatchState::new(), InputEvent::Tab);
        assert!(step.is_dirty());
        assert_eq!(step.state.cursor, 1);
        assert!(step.state.pending.is_empty());
    }

    #[test]
    fn test_tab_commits_pending_prefix() {
        let e = engine("ab\tc");
        let state = type_all(&e, MatchState::new(), &chars("ab"));
        let step = e.apply(&state, InputEvent::Tab);
        assert_eq!(step.state.cursor, 3);
    }

    #[test]
    fn test_unexpected_tab_requests_hint() {
        let e = engine("abc");
        let start = e.apply(&MatchState::new(), InputEvent::Char('a')).state;
        let step = e.apply(&start, InputEvent::Tab);
        assert_eq!(step.outcome, Outcome::HintRequested);
        assert_eq!(step.state, start);
    }

    #[test]
    fn test_unexpected_enter_rejects() {
        let e = engine("abc");
        let step = e.apply(&MatchState::new(), InputEvent::Enter);
        assert_eq!(
            step.outcome,
            Outcome::Rejected {
                expected: 'a',
                typed: '\n'
            }
        );
        assert_eq!(step.state.error_mark, Some(0));
    }

    #[test]
    fn test_enter_as_first_pending_char_advances() {
        let e = engine("\nx");
        let step = e.apply(&MatchState::new(), InputEvent::Enter);
        assert_eq!(step.state.cursor, 1);
        assert!(step.is_dirty());
    }

    #[test]
    fn test_space_skip_stops_at_end_of_text() {
        let e = engine("a    ");
        let state = type_all(&e, MatchState::new(), &chars("a "));
        assert_eq!(state.cursor, 5);
        assert!(state.completed);
    }

    #[test]
    fn test_virtual_enter_char_behaves_like_enter() {
        let e = engine("x\n  y");
        let state = e.apply(&MatchState::new(), InputEvent::Char('x')).state;
        let step = e.apply(&state, InputEvent::Char('\n'));
        assert_eq!(step.state.cursor, 4);
    }

    #[test]
    fn test_toggle_keyboard_leaves_state() {
        let e = engine("abc");
        let state = e.apply(&MatchState::new(), InputEvent::Char('a')).state;
        let step = e.apply(&state, InputEvent::ToggleKeyboard);
        assert_eq!(step.outcome, Outcome::KeyboardToggled);
        assert_eq!(step.state, state);
    }

    #[test]
    fn test_resume_clamps_cursor() {
        let state = MatchState::resume(4, 99, false);
        assert_eq!(state.cursor, 4);
        assert!(state.completed);

        let state = MatchState::resume(10, 3, false);
        assert_eq!(state.cursor, 3);
        assert!(!state.completed);

        let state = MatchState::resume(10, 3, true);
        assert!(state.completed);
    }

    #[test]
    fn test_empty_reference_ignores_input() {
        let e = engine("");
        let step = e.apply(&MatchState::new(), InputEvent::Char('a'));
        assert_eq!(step.outcome, Outcome::Ignored);
    }
}
