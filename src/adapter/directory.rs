//! Shared crawl loop and HTML helpers for directory-style sources
//!
//! Association and exhibition directories are both lists of HTML pages,
//! optionally paginated. The loop here fetches each page through the guard,
//! hands the body to the adapter's synchronous page parser and applies the
//! page-skipping rules. Parsed documents never live across an await.

use super::error::{AdapterError, ParseError};
use super::http::{page_url, Page, PageClient};
use crate::config::ConfigError;
use crate::guard::RateGuard;
use crate::record::RawRecord;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

/// Which pages to visit.
pub(crate) struct Listing<'a> {
    pub source_id: &'a str,
    pub urls: &'a [String],
    pub page_param: Option<&'a str>,
    pub max_pages: u32,
}

/// Fetch every listing page and parse it with `parse`.
///
/// Per base URL, pages are visited in order until `max_pages`, a missing
/// page or a page with no records. A page that fails to parse is skipped
/// and the next page is tried.
pub(crate) async fn crawl_listing<F>(
    client: &PageClient,
    guard: &RateGuard,
    listing: Listing<'_>,
    parse: F,
) -> Result<Vec<RawRecord>, AdapterError>
where
    F: Fn(&str, &str, DateTime<Utc>) -> Result<Vec<RawRecord>, ParseError> + Send + Sync,
{
    let mut records = Vec::new();
    let last_page = if listing.page_param.is_some() {
        listing.max_pages.max(1)
    } else {
        1
    };

    for base in listing.urls {
        for page in 1..=last_page {
            let url = page_url(base, listing.page_param, page)?;
            let body = match client.get(guard, &url, &[]).await? {
                Page::Body(body) => body,
                Page::Missing(status) => {
                    warn!(source = listing.source_id, %url, status, "page not found, skipping");
                    break;
                }
            };

            match parse(&body, &url, Utc::now()) {
                Ok(found) if found.is_empty() => {
                    debug!(source = listing.source_id, %url, "no entries on page");
                    break;
                }
                Ok(found) => {
                    debug!(source = listing.source_id, %url, count = found.len(), "parsed page");
                    records.extend(found);
                }
                Err(e) => {
                    warn!(source = listing.source_id, %url, error = %e, "skipping unparsable page");
                }
            }
        }
    }

    Ok(records)
}

/// Compile one configured CSS selector of source `source_id`.
pub(crate) fn compile(source_id: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::Selector {
        source_id: source_id.to_string(),
        selector: selector.to_string(),
        message: "not a valid CSS selector".to_string(),
    })
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of `selector` inside `element`, if non-empty.
pub(crate) fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// Attribute of the first match of `selector` inside `element`.
pub(crate) fn first_attr(
    element: ElementRef<'_>,
    selector: &Selector,
    attr: &str,
) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
