//! Shared crawl state
//!
//! One `SharedState` lives for the whole process. Pollers read it through
//! snapshot methods; the running coordinator holds the only `StateWriter`,
//! which `SharedState::begin` hands out only when no crawl is running.

use crate::crawler::Record;
use crate::state::crawl_state::{CrawlPhase, CrawlState, LogEntry, Progress};
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-wide crawl state, readable from any task
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<CrawlState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the state with a fresh running crawl and returns its writer
    ///
    /// Returns `None` and leaves the state untouched if a crawl is running.
    pub fn begin(&self) -> Option<StateWriter> {
        let mut state = write(&self.inner);
        if state.phase == CrawlPhase::Running {
            return None;
        }

        *state = CrawlState {
            phase: CrawlPhase::Running,
            started_at: Some(Utc::now()),
            ..CrawlState::default()
        };

        Some(StateWriter {
            inner: Arc::clone(&self.inner),
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        read(&self.inner).phase
    }

    /// Phase, page, trailing `tail` log entries and record count
    pub fn progress(&self, tail: usize) -> Progress {
        read(&self.inner).progress(tail)
    }

    /// Log entries from position `offset` onwards
    pub fn log_since(&self, offset: usize) -> Vec<LogEntry> {
        let state = read(&self.inner);
        state.log.get(offset..).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn records(&self) -> Vec<Record> {
        read(&self.inner).records.clone()
    }

    /// Full copy of the current state
    pub fn snapshot(&self) -> CrawlState {
        read(&self.inner).clone()
    }
}

/// Exclusive write access to the state of one running crawl
#[derive(Debug)]
pub struct StateWriter {
    inner: Arc<RwLock<CrawlState>>,
}

impl StateWriter {
    /// Appends a log entry
    pub fn log(&self, message: impl Into<String>) {
        write(&self.inner).log.push(LogEntry::new(message));
    }

    pub fn set_page(&self, page: u32) {
        write(&self.inner).current_page = page;
    }

    pub fn entry_seen(&self) {
        write(&self.inner).entries_seen += 1;
    }

    pub fn entry_skipped(&self) {
        write(&self.inner).entries_skipped += 1;
    }

    pub fn push_record(&self, record: Record) {
        write(&self.inner).records.push(record);
    }

    pub fn records(&self) -> Vec<Record> {
        read(&self.inner).records.clone()
    }

    /// Moves a running crawl to `Complete`
    pub fn complete(&self) -> bool {
        self.finish(CrawlPhase::Complete)
    }

    /// Moves a running crawl to `Failed`
    pub fn fail(&self) -> bool {
        self.finish(CrawlPhase::Failed)
    }

    // Only the first terminal transition takes effect.
    fn finish(&self, phase: CrawlPhase) -> bool {
        let mut state = write(&self.inner);
        if state.phase != CrawlPhase::Running {
            return false;
        }
        state.phase = phase;
        state.finished_at = Some(Utc::now());
        true
    }
}

fn read(lock: &RwLock<CrawlState>) -> RwLockReadGuard<'_, CrawlState> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<CrawlState>) -> RwLockWriteGuard<'_, CrawlState> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
