pub mod scheduler;
pub mod synchronizer;

pub use scheduler::DebounceScheduler;
pub use synchronizer::{SyncReport, Synchronizer};
