//! Harvester service
//!
//! The entry point presentation shells talk to. `start_crawl` spawns a crawl
//! on the tokio runtime and returns immediately; `progress` and `artifact` are
//! non-blocking reads that never touch the running crawl.

use crate::config::Config;
use crate::crawler::coordinator::Coordinator;
use crate::crawler::fetcher::{HttpSession, PageSource, SessionPair};
use crate::output::Artifact;
use crate::state::{CrawlPhase, LogEntry, Progress, SharedState};
use crate::HarvestError;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Acknowledgement of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Holds the report of the most recently completed crawl
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    inner: Arc<RwLock<Option<Artifact>>>,
}

impl ArtifactStore {
    pub fn store(&self, artifact: Artifact) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(artifact);
    }

    pub fn get(&self) -> Option<Artifact> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

type SessionOpener<S> = dyn Fn() -> crate::Result<SessionPair<S>> + Send + Sync;

/// Handle on the running (or last) crawl task
#[derive(Default)]
struct Control {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Runs crawls in the background and answers progress queries
pub struct Harvester<S: PageSource + 'static = HttpSession> {
    config: Arc<Config>,
    state: SharedState,
    artifacts: ArtifactStore,
    open_sessions: Arc<SessionOpener<S>>,
    control: Arc<Mutex<Control>>,
}

impl<S: PageSource + 'static> Clone for Harvester<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            state: self.state.clone(),
            artifacts: self.artifacts.clone(),
            open_sessions: Arc::clone(&self.open_sessions),
            control: Arc::clone(&self.control),
        }
    }
}

impl Harvester<HttpSession> {
    /// Creates a harvester that fetches over HTTP
    pub fn new(config: Config) -> Self {
        let fetcher = config.fetcher.clone();
        Self::with_sessions(config, move || Ok(SessionPair::open(&fetcher)?))
    }
}

impl<S: PageSource + 'static> Harvester<S> {
    /// Creates a harvester whose crawls use sessions from `open_sessions`
    pub fn with_sessions<F>(config: Config, open_sessions: F) -> Self
    where
        F: Fn() -> crate::Result<SessionPair<S>> + Send + Sync + 'static,
    {
        Self {
            config: Arc::new(config),
            state: SharedState::new(),
            artifacts: ArtifactStore::default(),
            open_sessions: Arc::new(open_sessions),
            control: Arc::new(Mutex::new(Control::default())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a crawl in the background
    ///
    /// Must be called from within a tokio runtime. While a crawl is running
    /// this is a no-op returning `AlreadyRunning`. The task handle is locked
    /// from the phase transition until the new task is stored, so `cancel`
    /// and `join` always see the crawl that was just started.
    ///
    /// # Returns
    ///
    /// * `Ok(StartOutcome)` - Acknowledgement
    /// * `Err(HarvestError)` - The sessions could not be opened; the new crawl is marked failed
    pub fn start_crawl(&self) -> crate::Result<StartOutcome> {
        let cancel = CancellationToken::new();
        let coordinator = Coordinator::new(&self.config, self.artifacts.clone(), cancel.clone())?;

        let mut control = self.control.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(writer) = self.state.begin() else {
            tracing::info!("Start requested while a crawl is running; ignoring");
            return Ok(StartOutcome::AlreadyRunning);
        };

        let sessions = match (self.open_sessions)() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::error!("Failed to open sessions: {}", e);
                writer.log(format!("error opening sessions: {}", e));
                writer.fail();
                return Err(e);
            }
        };

        let task = tokio::spawn(async move {
            if let Err(e) = coordinator.run(sessions, writer).await {
                tracing::error!("Crawl ended with error: {}", e);
            }
        });

        *control = Control {
            cancel,
            task: Some(task),
        };

        Ok(StartOutcome::Started)
    }

    /// Phase, current page, log tail and record count of the current crawl
    pub fn progress(&self) -> Progress {
        self.state.progress(self.config.output.log_tail)
    }

    /// Log entries from position `offset` onwards
    pub fn log_since(&self, offset: usize) -> Vec<LogEntry> {
        self.state.log_since(offset)
    }

    /// Read access to the full crawl state
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Report of the most recently completed crawl
    ///
    /// # Returns
    ///
    /// * `Ok(Artifact)` - Report bytes with filename and content type
    /// * `Err(HarvestError::NotReady)` - No crawl has completed yet
    pub fn artifact(&self) -> crate::Result<Artifact> {
        self.artifacts.get().ok_or(HarvestError::NotReady)
    }

    /// Asks the running crawl to stop at its next checkpoint
    pub fn cancel(&self) {
        let control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        control.cancel.cancel();
    }

    /// Waits for the current crawl task to finish and returns the final phase
    pub async fn join(&self) -> CrawlPhase {
        let task = self
            .control
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .task
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!("Crawl task panicked: {}", e);
            }
        }

        self.state.phase()
    }
}
