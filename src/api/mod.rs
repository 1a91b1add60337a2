pub mod client;
pub mod progress;
pub mod types;

pub use client::{ApiClient, AuthContext, ContentSource};
pub use progress::HttpProgressStore;
pub use types::{CodeFile, Direction, Project, SessionStatus};
