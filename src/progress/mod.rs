//! The progress store: single source of truth for "where did the user leave
//! off", bridging the in-memory snapshot, an sqlite mirror and the remote
//! progress service.

mod cache;
mod store;

pub use cache::{CachedRecord, ProgressCache};
pub use store::ProgressStore;
