//! Detail page scraping: one URL in, one [`JobRecord`] out.
//!
//! Every fetch runs on its own session, opened for the fetch and closed when
//! it finishes, or released by its guard if the fetch is abandoned. Page-level problems (failed navigation, missing elements,
//! slow pages) never escape: they turn into sentinel field values. The only
//! error returned is a session that could not be started at all.

use crate::config::{DetailConfig, FieldConfig, SiteConfig};
use crate::models::{JobRecord, DESCRIPTION_NOT_AVAILABLE};
use crate::scrapers::description::Segmenter;
use crate::scrapers::locator::{extract_field, first_match};
use crate::session::{Session, SessionError, SessionFactory, SessionGuard};
use crate::utils::truncate_for_log;
use scraper::Html;
use tracing::{debug, info, instrument, warn};

/// Fetch and parse the detail page at `url` on a fresh session.
///
/// # Errors
///
/// Only [`SessionError::NoSupportedEngine`] is returned; navigation and
/// extraction failures yield a record populated with sentinels.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_detail<F: SessionFactory>(
    factory: &F,
    site: &SiteConfig,
    segmenter: &Segmenter,
    url: &str,
) -> Result<JobRecord, SessionError> {
    let mut session = SessionGuard::new(factory.open().await?);
    let record = scrape_detail(&mut *session, site, segmenter, url).await;
    session.close().await;

    info!(found = record.extracted_fields(), "Scraped job listing");
    Ok(record)
}

/// Load `url` on `session` and extract a record from whatever rendered.
async fn scrape_detail<S: Session>(
    session: &mut S,
    site: &SiteConfig,
    segmenter: &Segmenter,
    url: &str,
) -> JobRecord {
    if let Err(e) = session.goto(url).await {
        warn!(error = %e, "Detail page failed to load; using sentinels");
        return JobRecord::unavailable(url);
    }

    if !session.wait_for(&site.detail.title.locators, site.detail_wait()).await {
        debug!(wait = ?site.detail_wait(), "Title not present before timeout; extracting anyway");
    }

    match session.page_source() {
        Some(html) => parse_detail(html, url, &site.detail, segmenter),
        None => JobRecord::unavailable(url),
    }
}

/// Extract every field of a detail page from its markup.
pub fn parse_detail(html: &str, url: &str, fields: &DetailConfig, segmenter: &Segmenter) -> JobRecord {
    let document = Html::parse_document(html);
    let field = |config: &FieldConfig| {
        extract_field(&document, &config.locators, &config.fallback)
    };

    let description = match first_match(&document, &fields.description_container) {
        Some(container) => segmenter.segment(container),
        None => {
            debug!("No description container found");
            DESCRIPTION_NOT_AVAILABLE.to_string()
        }
    };
    debug!(description = %truncate_for_log(&description, 120), "Segmented description");

    JobRecord {
        url: url.to_string(),
        title: field(&fields.title),
        company: field(&fields.company),
        location: field(&fields.location),
        salary: field(&fields.salary),
        description,
    }
}
