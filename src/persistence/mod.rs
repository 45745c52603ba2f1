//! Local, file-backed persistence.
//!
//! Harvested pages are plain JSON files under a data root and the resume
//! counters live in a single progress file. Both are written with
//! write-to-temp-then-rename so a crash never leaves a half-written file.

mod atomic;
mod error;
mod page_store;
mod progress_store;

pub use error::PersistenceError;
pub use page_store::PageStore;
pub use progress_store::{ProgressRecord, ProgressStore};
