//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of a crawl (idle, running, complete, failed)
//! - `CrawlState`: current page, append-only log, records and counters
//! - `SharedState` / `StateWriter`: one writer, many concurrent readers

mod crawl_state;
mod shared;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState, LogEntry, Progress};
pub use shared::{SharedState, StateWriter};
