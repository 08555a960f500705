//! In-memory directory used by the crawler unit tests

use crate::config::{Config, DirectoryConfig};
use crate::crawler::fetcher::{Document, FetchError, PageSource, SessionPair};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

pub(crate) const BASE_URL: &str = "https://directory.test";

pub(crate) fn test_config() -> Config {
    Config {
        directory: DirectoryConfig {
            base_url: BASE_URL.to_string(),
            ..DirectoryConfig::default()
        },
        ..Config::default()
    }
}

pub(crate) fn listing_url(page: u32) -> String {
    test_config()
        .directory
        .listing_url(page)
        .unwrap()
        .to_string()
}

/// A listing page; `last_marked` adds a two-item pagination control whose
/// final item is (or is not) marked current
pub(crate) fn listing_html(links: &[&str], last_marked: Option<bool>) -> String {
    let items: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();

    let pagination = match last_marked {
        Some(true) => r#"<ul class="pagination"><li>1</li><li class="current">2</li></ul>"#,
        Some(false) => r#"<ul class="pagination"><li class="current">1</li><li>2</li></ul>"#,
        None => "",
    };

    format!(
        r#"<html><body><div id="results"><ul class="search-results">{}</ul>{}</div></body></html>"#,
        items, pagination
    )
}

pub(crate) fn detail_html(name: &str) -> String {
    format!(
        concat!(
            r#"<html><body><h1>{}</h1>"#,
            r#"<dl class="title-list"><dt>Address</dt><dd>1 Test Street</dd></dl>"#,
            "</body></html>"
        ),
        name
    )
}

#[derive(Clone)]
enum FakePage {
    Html(String),
    Timeout,
}

/// Serves canned pages and records every requested URL
#[derive(Clone, Default)]
pub(crate) struct FakeSite {
    pages: Arc<HashMap<String, FakePage>>,
    requests: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeSite {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.with(url, FakePage::Html(html.to_string()))
    }

    pub(crate) fn timeout(self, url: &str) -> Self {
        self.with(url, FakePage::Timeout)
    }

    /// Makes every load wait for a permit on `gate()`
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub(crate) fn gate(&self) -> Arc<Semaphore> {
        Arc::clone(self.gate.as_ref().expect("site is not gated"))
    }

    pub(crate) fn sessions(&self) -> SessionPair<FakeSite> {
        SessionPair::new(self.clone(), self.clone())
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn with(self, url: &str, page: FakePage) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(url.to_string(), page);
        Self {
            pages: Arc::new(pages),
            ..self
        }
    }
}

impl PageSource for FakeSite {
    async fn load(
        &self,
        url: &Url,
        ready_selector: &str,
        timeout: Duration,
    ) -> Result<Document, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        match self.pages.get(url.as_str()) {
            Some(FakePage::Html(html)) => {
                let doc = Document::new(url.clone(), html.clone());
                if doc.has_marker(ready_selector) {
                    Ok(doc)
                } else {
                    Err(FetchError::MarkerMissing {
                        url: url.to_string(),
                        selector: ready_selector.to_string(),
                    })
                }
            }
            Some(FakePage::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
