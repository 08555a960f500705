use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for firm-harvest
///
/// Every section is optional; the defaults target the ICAEW firm directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the directory lives and how its listing pages are addressed
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Site root; entry links are resolved against it
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path of the search results page
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,

    /// Value of the `searchType` query parameter
    #[serde(rename = "search-type", default = "default_search_type")]
    pub search_type: String,

    /// Free-text search term (empty matches everything)
    #[serde(default)]
    pub term: String,

    /// Fixed location filter
    #[serde(default = "default_location")]
    pub location: String,
}

impl DirectoryConfig {
    /// Computes the listing URL for a 1-based page number
    ///
    /// # Example
    ///
    /// ```
    /// use firm_harvest::config::DirectoryConfig;
    ///
    /// let directory = DirectoryConfig::default();
    /// let url = directory.listing_url(2).unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://find.icaew.com/search?searchType=firm&term=&location_freetext=e11+1jz&page=2"
    /// );
    /// ```
    pub fn listing_url(&self, page: u32) -> Result<Url, url::ParseError> {
        Ok(page_url(&self.search_url()?, page))
    }

    /// The listing URL without its page number
    pub fn search_url(&self) -> Result<Url, url::ParseError> {
        let mut url = self.base()?.join(&self.search_path)?;
        url.query_pairs_mut()
            .clear()
            .append_pair("searchType", &self.search_type)
            .append_pair("term", &self.term)
            .append_pair("location_freetext", &self.location);
        Ok(url)
    }

    /// Parses the configured site root
    pub fn base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }
}

/// Appends the page number to a search URL
pub fn page_url(search_url: &Url, page: u32) -> Url {
    let mut url = search_url.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            search_type: default_search_type(),
            term: String::new(),
            location: default_location(),
        }
    }
}

/// Page fetcher identification and timing
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Identification string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "viewport-width", default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Per-fetch timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Hard caps on a single crawl; unset means unbounded
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of listing pages to visit
    #[serde(rename = "max-pages")]
    pub max_pages: Option<u32>,

    /// Maximum number of entry links to follow
    #[serde(rename = "max-entries")]
    pub max_entries: Option<u32>,

    /// Maximum wall-clock duration of a crawl (seconds)
    #[serde(rename = "max-duration-secs")]
    pub max_duration_secs: Option<u64>,
}

/// Report and progress output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Where the CLI writes the finished spreadsheet
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,

    /// Name of the single worksheet
    #[serde(rename = "sheet-name", default = "default_sheet_name")]
    pub sheet_name: String,

    /// Number of trailing log entries returned by a progress query
    #[serde(rename = "log-tail", default = "default_log_tail")]
    pub log_tail: usize,

    /// How often the CLI polls progress (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
            sheet_name: default_sheet_name(),
            log_tail: default_log_tail(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://find.icaew.com".to_string()
}

fn default_search_path() -> String {
    "/search".to_string()
}

fn default_search_type() -> String {
    "firm".to_string()
}

fn default_location() -> String {
    "e11 1jz".to_string()
}

fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36"
    )
    .to_string()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_report_path() -> String {
    "firms.xlsx".to_string()
}

fn default_sheet_name() -> String {
    "Firms".to_string()
}

fn default_log_tail() -> usize {
    20
}

fn default_poll_interval_ms() -> u64 {
    500
}
