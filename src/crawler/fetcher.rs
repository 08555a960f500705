//! Page fetcher implementation
//!
//! This module loads directory pages for the crawler:
//! - `PageSource` is the capability the coordinator drives (`load(url, ready, timeout)`)
//! - `HttpSession` implements it over a reqwest client with a fixed identification string
//! - `SessionPair` holds one session for listing pages and one for detail pages
//!
//! A load succeeds only once the page contains an element matching the ready
//! selector. Nothing here retries; retry policy belongs to the caller.

use crate::config::FetcherConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use scraper::{Html, Selector};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a page could not be loaded
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {cause}")]
    Request { url: String, cause: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("ready marker `{selector}` not found on {url}")]
    MarkerMissing { url: String, selector: String },
}

impl FetchError {
    /// The URL whose load failed
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Timeout { url, .. }
            | Self::MarkerMissing { url, .. } => url,
        }
    }
}

/// A loaded page: the final URL and its markup
///
/// The parsed `Html` tree is not `Send`, so documents carry raw markup and are
/// parsed on demand inside synchronous code.
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    html: String,
}

impl Document {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Parses the markup into a queryable tree
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Returns true if any element matches `selector`
    ///
    /// An unparsable selector never matches.
    pub fn has_marker(&self, selector: &str) -> bool {
        match Selector::parse(selector) {
            Ok(selector) => self.parse().select(&selector).next().is_some(),
            Err(_) => false,
        }
    }
}

/// Something that can load a page and wait for its ready marker
///
/// Implementations mutate session state; callers never issue two loads on the
/// same source concurrently.
pub trait PageSource: Send + Sync {
    fn load(
        &self,
        url: &Url,
        ready_selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Document, FetchError>> + Send;
}

/// The two sessions a crawl uses
///
/// Detail fetches go through their own session so they never disturb the
/// listing page still being iterated. Dropping the pair releases both sessions.
pub struct SessionPair<S> {
    pub listing: S,
    pub detail: S,
}

impl<S: PageSource> SessionPair<S> {
    pub fn new(listing: S, detail: S) -> Self {
        Self { listing, detail }
    }
}

impl SessionPair<HttpSession> {
    /// Opens a listing session and a detail session with the same identity
    pub fn open(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            HttpSession::open("listing", config)?,
            HttpSession::open("detail", config)?,
        ))
    }
}

/// Builds an HTTP client with the configured identification and viewport hints
///
/// # Example
///
/// ```no_run
/// use firm_harvest::config::FetcherConfig;
/// use firm_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("sec-ch-viewport-width"),
        HeaderValue::from(config.viewport_width),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-viewport-height"),
        HeaderValue::from(config.viewport_height),
    );

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A reqwest-backed page session
pub struct HttpSession {
    label: &'static str,
    client: Client,
}

impl HttpSession {
    pub fn open(label: &'static str, config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        tracing::debug!("Opening {} session", label);
        Ok(Self {
            label,
            client: build_http_client(config)?,
        })
    }

    async fn navigate(&self, url: &Url, ready_selector: &str) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            cause: e.to_string(),
        })?;

        let document = Document::new(final_url, body);
        if !document.has_marker(ready_selector) {
            return Err(FetchError::MarkerMissing {
                url: url.to_string(),
                selector: ready_selector.to_string(),
            });
        }

        Ok(document)
    }
}

impl PageSource for HttpSession {
    async fn load(
        &self,
        url: &Url,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<Document, FetchError> {
        tracing::debug!("[{}] GET {}", self.label, url);

        match tokio::time::timeout(timeout, self.navigate(url, ready_selector)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        tracing::debug!("Closing {} session", self.label);
    }
}
