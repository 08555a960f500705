//! firm-harvest: a directory harvester
//!
//! This crate walks the paginated listing of an online firm directory, follows
//! every listed entry to its detail page, extracts a fixed set of fields, and
//! assembles the harvested records into a spreadsheet report.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

pub use crawler::{ExtractionError, FetchError};
pub use output::ReportError;

/// Main error type for firm-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Failed to load listing page {page}: {source}")]
    ListingFailed { page: u32, source: FetchError },

    #[error("Crawl was cancelled")]
    Cancelled,

    #[error("No completed report is available yet")]
    NotReady,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for firm-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Harvester, Record, StartOutcome};
pub use output::Artifact;
pub use state::{CrawlPhase, LogEntry, Progress};
