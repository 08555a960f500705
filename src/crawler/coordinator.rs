//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator walks listing pages from page 1 until the pagination control
//! reports the last page. Every entry link on a page is followed, in listing
//! order, through the detail session. A failed detail page only skips its own
//! entry; a failed listing page ends the crawl.
//!
//! Progress is published through the crawl's `StateWriter`, and a completed
//! crawl leaves its report in the shared `ArtifactStore`.

use crate::config::{page_url, Config, LimitsConfig};
use crate::crawler::detail::{extract, ExtractionError, Record, DETAIL_READY_SELECTOR};
use crate::crawler::fetcher::{FetchError, PageSource, SessionPair};
use crate::crawler::harvester::ArtifactStore;
use crate::crawler::listing::{parse_listing, ListingPage, LISTING_READY_SELECTOR};
use crate::output::build_report;
use crate::state::StateWriter;
use crate::HarvestError;
use std::fmt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Hard caps guarding against a pagination signal that never says "last"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_pages: Option<u32>,
    pub max_entries: Option<u32>,
    pub max_duration: Option<Duration>,
}

impl From<&LimitsConfig> for CrawlLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            max_entries: config.max_entries,
            max_duration: config.max_duration_secs.map(Duration::from_secs),
        }
    }
}

/// Result of processing one entry link
#[derive(Debug)]
pub enum EntryOutcome {
    Scraped(Record),
    Skipped(SkipReason),
}

/// Why an entry contributed no record
#[derive(Debug)]
pub enum SkipReason {
    Fetch(FetchError),
    Extract(ExtractionError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{}", e),
            Self::Extract(e) => write!(f, "{}", e),
        }
    }
}

/// Why a crawl stopped before the last page
enum Halt {
    Limit(String),
    Cancelled,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    search_url: Url,
    base_url: Url,
    timeout: Duration,
    limits: CrawlLimits,
    sheet_name: String,
    artifacts: ArtifactStore,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The directory URLs in `config` do not parse
    pub fn new(
        config: &Config,
        artifacts: ArtifactStore,
        cancel: CancellationToken,
    ) -> crate::Result<Self> {
        Ok(Self {
            search_url: config.directory.search_url()?,
            base_url: config.directory.base()?,
            timeout: config.fetcher.timeout(),
            limits: CrawlLimits::from(&config.limits),
            sheet_name: config.output.sheet_name.clone(),
            artifacts,
            cancel,
        })
    }

    /// Runs the crawl to completion
    ///
    /// The sessions are owned for the duration of the crawl and released when
    /// this returns, whatever the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records harvested
    /// * `Err(HarvestError)` - A listing page failed, the crawl was cancelled,
    ///   or the report could not be built
    pub async fn run<S: PageSource>(
        self,
        sessions: SessionPair<S>,
        state: StateWriter,
    ) -> crate::Result<usize> {
        let run = CrawlRun {
            coordinator: self,
            sessions,
            state,
            started: Instant::now(),
            entries_seen: 0,
        };
        run.execute().await
    }
}

/// One crawl in progress
struct CrawlRun<S> {
    coordinator: Coordinator,
    sessions: SessionPair<S>,
    state: StateWriter,
    started: Instant,
    entries_seen: u32,
}

impl<S: PageSource> CrawlRun<S> {
    async fn execute(mut self) -> crate::Result<usize> {
        tracing::info!("Starting crawl at {}", self.coordinator.search_url);
        let mut page = 1;

        loop {
            if let Some(halt) = self.check_page_limits(page) {
                return self.halt(halt);
            }

            self.state.log(format!("scraping page {}", page));
            self.state.set_page(page);
            tracing::info!("Scraping listing page {}", page);

            let listing = match self.load_listing(page).await {
                Ok(listing) => listing,
                Err(e) => return Err(self.fail_listing(page, e)),
            };
            tracing::debug!(
                "Listing page {} has {} entries (last: {})",
                page,
                listing.entries.len(),
                listing.is_last
            );

            for link in &listing.entries {
                if let Some(halt) = self.check_entry_limits() {
                    return self.halt(halt);
                }
                self.entries_seen += 1;
                self.state.entry_seen();

                match self.process_entry(link).await {
                    EntryOutcome::Scraped(record) => {
                        let message = format!("scraped firm: {}", record.name);
                        tracing::info!("Scraped firm: {}", record.name);
                        self.state.push_record(record);
                        self.state.log(message);
                    }
                    EntryOutcome::Skipped(reason) => {
                        tracing::warn!("Skipping {}: {}", link, reason);
                        self.state.entry_skipped();
                        self.state
                            .log(format!("error scraping firm at {}, skipping", link));
                    }
                }
            }

            if listing.is_last {
                return self.finish();
            }
            page += 1;
        }
    }

    async fn load_listing(&self, page: u32) -> Result<ListingPage, FetchError> {
        let url = page_url(&self.coordinator.search_url, page);
        let doc = self
            .sessions
            .listing
            .load(&url, LISTING_READY_SELECTOR, self.coordinator.timeout)
            .await?;
        Ok(parse_listing(&doc, &self.coordinator.base_url))
    }

    /// Fetches and extracts one entry; never fails the crawl
    async fn process_entry(&self, link: &Url) -> EntryOutcome {
        let doc = match self
            .sessions
            .detail
            .load(link, DETAIL_READY_SELECTOR, self.coordinator.timeout)
            .await
        {
            Ok(doc) => doc,
            Err(e) => return EntryOutcome::Skipped(SkipReason::Fetch(e)),
        };

        match extract(&doc) {
            Ok(record) => EntryOutcome::Scraped(record),
            Err(e) => EntryOutcome::Skipped(SkipReason::Extract(e)),
        }
    }

    fn check_page_limits(&self, page: u32) -> Option<Halt> {
        if self.coordinator.cancel.is_cancelled() {
            return Some(Halt::Cancelled);
        }

        if let Some(max_pages) = self.coordinator.limits.max_pages {
            if page > max_pages {
                return Some(Halt::Limit(format!("page limit of {}", max_pages)));
            }
        }

        self.check_deadline()
    }

    fn check_entry_limits(&self) -> Option<Halt> {
        if self.coordinator.cancel.is_cancelled() {
            return Some(Halt::Cancelled);
        }

        if let Some(max_entries) = self.coordinator.limits.max_entries {
            if self.entries_seen >= max_entries {
                return Some(Halt::Limit(format!("entry limit of {}", max_entries)));
            }
        }

        self.check_deadline()
    }

    fn check_deadline(&self) -> Option<Halt> {
        let max_duration = self.coordinator.limits.max_duration?;
        if self.started.elapsed() >= max_duration {
            return Some(Halt::Limit(format!(
                "time limit of {}s",
                max_duration.as_secs()
            )));
        }
        None
    }

    fn halt(self, halt: Halt) -> crate::Result<usize> {
        match halt {
            Halt::Limit(limit) => {
                tracing::warn!("Stopping early: {} reached", limit);
                self.state.log(format!("stopping early: {} reached", limit));
                self.finish()
            }
            Halt::Cancelled => {
                tracing::warn!("Crawl cancelled");
                self.state.log("scraping cancelled");
                self.state.fail();
                Err(HarvestError::Cancelled)
            }
        }
    }

    fn fail_listing(self, page: u32, error: FetchError) -> HarvestError {
        tracing::error!("Failed to load listing page {}: {}", page, error);
        self.state
            .log(format!("error loading page {}: {}", page, error));
        self.state.fail();
        HarvestError::ListingFailed {
            page,
            source: error,
        }
    }

    /// Builds the report, publishes it, and marks the crawl complete
    fn finish(self) -> crate::Result<usize> {
        let records = self.state.records();

        let artifact = match build_report(&records, &self.coordinator.sheet_name) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!("Failed to build report: {}", e);
                self.state.log(format!("error building report: {}", e));
                self.state.fail();
                return Err(e.into());
            }
        };

        self.coordinator.artifacts.store(artifact);
        self.state.log("scraping complete");
        self.state.complete();

        tracing::info!(
            "Crawl completed: {} records from {} entries in {:?}",
            records.len(),
            self.entries_seen,
            self.started.elapsed()
        );

        Ok(records.len())
    }
}
