//! Detail page parser
//!
//! Extracts one `Record` from a firm's detail page. The name comes from the
//! primary heading and is required; the remaining fields are read from the
//! `dl.title-list` definition list by exact label match and are optional.

use crate::crawler::fetcher::Document;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Element that must be present before a detail page counts as loaded
pub const DETAIL_READY_SELECTOR: &str = ".title-list";

const NAME_SELECTOR: &str = "h1";
const FIELD_LIST_SELECTOR: &str = "dl.title-list";

const ADDRESS_LABEL: &str = "Address";
const WEBSITE_LABEL: &str = "Website";
const EMAIL_LABEL: &str = "Email address";

/// One harvested directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub address: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
}

/// Why a detail page produced no record
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no firm name heading on {url}")]
    MissingName { url: String },
}

/// Extracts a record from a loaded detail page
pub fn extract(doc: &Document) -> Result<Record, ExtractionError> {
    let html = doc.parse();

    let name = heading_text(&html).ok_or_else(|| ExtractionError::MissingName {
        url: doc.url().to_string(),
    })?;

    Ok(Record {
        name,
        address: labelled_value(&html, ADDRESS_LABEL),
        website: labelled_value(&html, WEBSITE_LABEL),
        email: labelled_value(&html, EMAIL_LABEL),
    })
}

fn heading_text(html: &Html) -> Option<String> {
    let selector = Selector::parse(NAME_SELECTOR).ok()?;

    html.select(&selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|s| !s.is_empty())
}

/// Reads the value paired with the `dt` whose text equals `label`
///
/// The value is the `dt`'s immediately following sibling element, and only
/// when that element is a `dd`.
fn labelled_value(html: &Html, label: &str) -> Option<String> {
    let list_selector = Selector::parse(FIELD_LIST_SELECTOR).ok()?;
    let label_selector = Selector::parse("dt").ok()?;

    let list = html.select(&list_selector).next()?;
    let term = list
        .select(&label_selector)
        .find(|dt| element_text(dt) == label)?;

    let value = term.next_siblings().find_map(ElementRef::wrap)?;
    if value.value().name() != "dd" {
        return None;
    }

    Some(element_text(&value))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
