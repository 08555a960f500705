//! Crawler module for harvesting directory entries
//!
//! This module contains the core crawling logic, including:
//! - Page fetching through a listing session and a detail session
//! - Listing page parsing (entry links and the last-page signal)
//! - Detail page parsing into records
//! - Crawl coordination and the background harvester service

mod coordinator;
mod detail;
mod fetcher;
mod harvester;
mod listing;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::{Coordinator, CrawlLimits, EntryOutcome, SkipReason};
pub use detail::{extract, ExtractionError, Record, DETAIL_READY_SELECTOR};
pub use fetcher::{build_http_client, Document, FetchError, HttpSession, PageSource, SessionPair};
pub use harvester::{ArtifactStore, Harvester, StartOutcome};
pub use listing::{entries, is_last_page, parse_listing, ListingPage, LISTING_READY_SELECTOR};

use crate::config::Config;

/// Runs a complete crawl over HTTP and waits for it to finish
///
/// Convenience wrapper for callers that do not poll progress.
///
/// # Example
///
/// ```no_run
/// use firm_harvest::config::Config;
/// use firm_harvest::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let harvester = crawl(Config::default()).await?;
/// let report = harvester.artifact()?;
/// std::fs::write(&report.filename, &report.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> crate::Result<Harvester> {
    let harvester = Harvester::new(config);
    harvester.start_crawl()?;
    let phase = harvester.join().await;
    tracing::debug!("Crawl finished in phase {}", phase);
    Ok(harvester)
}
