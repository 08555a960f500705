//! Crawl statistics
//!
//! Derives summary numbers from a crawl's state and prints them for the operator.

use crate::state::{CrawlPhase, CrawlState};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Final phase of the crawl
    pub phase: CrawlPhase,

    /// Listing pages visited
    pub pages_visited: u32,

    /// Entry links followed
    pub entries_seen: u32,

    /// Records harvested
    pub records: usize,

    /// Entries skipped after a fetch or extraction failure
    pub entries_skipped: u32,

    /// Wall-clock duration, if the crawl has finished
    pub duration_seconds: Option<i64>,
}

impl CrawlStatistics {
    /// Summarises a crawl state
    pub fn from_state(state: &CrawlState) -> Self {
        let duration_seconds = match (state.started_at(), state.finished_at()) {
            (Some(started), Some(finished)) => Some((finished - started).num_seconds()),
            _ => None,
        };

        Self {
            phase: state.phase(),
            pages_visited: state.current_page(),
            entries_seen: state.entries_seen(),
            records: state.records().len(),
            entries_skipped: state.entries_skipped(),
            duration_seconds,
        }
    }

    /// Percentage of followed entries that produced a record
    pub fn success_rate(&self) -> f64 {
        if self.entries_seen == 0 {
            return 0.0;
        }
        (self.records as f64 / self.entries_seen as f64) * 100.0
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");
    println!("Status: {}", stats.phase);
    println!("Listing pages visited: {}", stats.pages_visited);
    println!("Entries followed: {}", stats.entries_seen);
    println!("Records harvested: {}", stats.records);
    println!("Entries skipped: {}", stats.entries_skipped);
    println!("Success rate: {:.1}%", stats.success_rate());

    if let Some(seconds) = stats.duration_seconds {
        println!("Duration: {}s", seconds);
    }
}
