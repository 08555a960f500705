/// Crawl state definitions for tracking harvest progress
///
/// This module defines the lifecycle phase of a crawl, its append-only log,
/// and the read-only progress view handed to pollers.
use crate::crawler::Record;
use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlPhase {
    /// No crawl has been started
    #[default]
    Idle,

    /// A crawl is walking the directory
    Running,

    /// The last listing page was processed and the report is available
    Complete,

    /// A listing page could not be loaded, or the crawl was cancelled
    Failed,
}

impl CrawlPhase {
    /// Returns true once the crawl can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped line of the operator-facing crawl log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Everything known about the current (or most recent) crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    pub(crate) phase: CrawlPhase,
    pub(crate) current_page: u32,
    pub(crate) log: Vec<LogEntry>,
    pub(crate) records: Vec<Record>,
    pub(crate) entries_seen: u32,
    pub(crate) entries_skipped: u32,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

impl CrawlState {
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Entry links the crawl attempted
    pub fn entries_seen(&self) -> u32 {
        self.entries_seen
    }

    /// Entry links that produced no record
    pub fn entries_skipped(&self) -> u32 {
        self.entries_skipped
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Builds the poller view with at most `tail` trailing log entries
    pub fn progress(&self, tail: usize) -> Progress {
        let skip = self.log.len().saturating_sub(tail);
        Progress {
            phase: self.phase,
            current_page: self.current_page,
            log_tail: self.log[skip..].to_vec(),
            log_len: self.log.len(),
            record_count: self.records.len(),
        }
    }
}

/// Read-only snapshot returned by a progress query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: CrawlPhase,
    pub current_page: u32,
    pub log_tail: Vec<LogEntry>,
    /// Total number of log entries so far
    pub log_len: usize,
    pub record_count: usize,
}
