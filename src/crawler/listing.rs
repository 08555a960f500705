//! Listing page parser
//!
//! A listing page holds a results container of entries and, when the directory
//! spans several pages, a pagination control. The pagination control is the
//! only termination signal: no control means a single page, otherwise the page
//! is last when the control's final item carries the `current` class.

use crate::crawler::fetcher::Document;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Element that must be present before a listing page counts as loaded
pub const LISTING_READY_SELECTOR: &str = "#results";

const RESULTS_SELECTOR: &str = ".search-results";
const PAGINATION_SELECTOR: &str = "ul.pagination";
const CURRENT_CLASS: &str = "current";

/// What the coordinator needs from one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Entry links in listing order
    pub entries: Vec<Url>,

    /// Whether this is the final listing page
    pub is_last: bool,
}

/// Parses a listing document into its entries and last-page flag
pub fn parse_listing(doc: &Document, base_url: &Url) -> ListingPage {
    let html = doc.parse();
    ListingPage {
        entries: entries(&html, base_url),
        is_last: is_last_page(&html),
    }
}

/// Returns the entry links inside the results container, in order
///
/// A missing container yields no entries. Items without a link are skipped.
pub fn entries(html: &Html, base_url: &Url) -> Vec<Url> {
    let (Ok(container_selector), Ok(item_selector), Ok(link_selector)) = (
        Selector::parse(RESULTS_SELECTOR),
        Selector::parse("li"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    let Some(container) = html.select(&container_selector).next() else {
        tracing::debug!("No results container on listing page");
        return Vec::new();
    };

    let mut links = Vec::new();
    for item in container.select(&item_selector) {
        let href = item
            .select(&link_selector)
            .next()
            .and_then(|anchor| anchor.value().attr("href"));

        match href.and_then(|href| resolve_entry(href, base_url)) {
            Some(url) => links.push(url),
            None => tracing::debug!("Skipping listing item without a usable link"),
        }
    }

    links
}

/// Returns true if the listing has no further pages
pub fn is_last_page(html: &Html) -> bool {
    let (Ok(nav_selector), Ok(item_selector)) =
        (Selector::parse(PAGINATION_SELECTOR), Selector::parse("li"))
    else {
        return true;
    };

    let Some(nav) = html.select(&nav_selector).next() else {
        return true;
    };

    match nav.select(&item_selector).last() {
        Some(last) => has_class(&last, CURRENT_CLASS),
        None => true,
    }
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Resolves an entry href against the site root
fn resolve_entry(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
