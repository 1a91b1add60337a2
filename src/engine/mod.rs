pub mod entities;
pub mod matcher;
pub mod reference;

pub use matcher::{InputEvent, MatchEngine, MatchRules, MatchState, Outcome, Step};
pub use reference::ReferenceText;
