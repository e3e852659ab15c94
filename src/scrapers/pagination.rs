//! Search results crawling.
//!
//! Walks the paginated search results for one query, collecting the detail
//! page URL of every job card. Pages are visited strictly in order on a
//! single session, since the "next page" control only exists on the page
//! currently loaded.
//!
//! The crawl stops at the first of:
//! - the page ceiling (`max_pages`)
//! - a results page with no job cards
//! - a missing "next page" control
//! - a page that fails to load
//!
//! None of these is an error; the URLs collected so far are returned.

use crate::config::SearchConfig;
use crate::scrapers::locator::{element_text, Locator};
use crate::session::Session;
use itertools::Itertools;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Build the first results page URL for `query` in `location`.
///
/// Both values are percent-encoded before substitution into the template's
/// `{query}` and `{location}` placeholders.
pub fn search_url(template: &str, query: &str, location: &str) -> String {
    template
        .replace("{query}", &urlencoding::encode(query.trim()))
        .replace("{location}", &urlencoding::encode(location.trim()))
}

/// Detail URLs of every job card in a results page, in page order.
///
/// Relative links are resolved against `base_url`. Cards without a link are
/// skipped.
pub fn extract_card_urls(html: &str, base_url: Option<&str>, card: &Locator, link: &Locator) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = base_url.and_then(|u| Url::parse(u).ok());

    card.find_all(&document)
        .into_iter()
        .filter_map(|card_el| {
            let anchor = link.find_within(card_el);
            let href = anchor.and_then(|a| a.value().attr("href"));
            if href.is_none() {
                debug!(card = %element_text(card_el), "Job card without a detail link");
            }
            href
        })
        .map(|href| match &base {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        })
        .collect()
}

/// Crawl up to `max_pages` results pages for `query` and return the detail
/// URLs found, each exactly once, in discovery order.
#[instrument(level = "info", skip(session, search, results_wait))]
pub async fn crawl<S: Session>(
    session: &mut S,
    search: &SearchConfig,
    results_wait: Duration,
    query: &str,
    location: &str,
    max_pages: usize,
) -> Vec<String> {
    let max_pages = max_pages.max(1);
    let start_url = search_url(&search.url_template, query, location);
    let mut found: Vec<String> = Vec::new();

    info!(url = %start_url, "Fetching search results");
    if let Err(e) = session.goto(&start_url).await {
        warn!(error = %e, "Search page failed to load");
        return found;
    }

    for page in 0..max_pages {
        if !session
            .wait_for(std::slice::from_ref(&search.card), results_wait)
            .await
        {
            info!(page, "No job cards found on the page");
            break;
        }

        let urls = match session.page_source() {
            Some(html) => extract_card_urls(html, session.current_url(), &search.card, &search.card_link),
            None => Vec::new(),
        };
        info!(page, cards = urls.len(), "Found job cards");
        found = found.into_iter().chain(urls).unique().collect();

        if page + 1 == max_pages {
            debug!(max_pages, "Page ceiling reached");
            break;
        }

        match session.click(&search.next_page).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(page, "No next page control");
                break;
            }
            Err(e) => {
                warn!(page, error = %e, "Next page failed to load");
                break;
            }
        }
    }

    info!(count = found.len(), "Collected job URLs");
    found
}
