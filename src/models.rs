//! Data models for scraped job listings and per-query crawl results.
//!
//! This module defines the records handed to the output sink:
//! - [`JobRecord`]: One job listing extracted from a detail page
//! - [`CrawlResult`]: All listings found for one search query, plus run metadata
//!
//! Fields that could not be extracted carry a fixed sentinel string instead of
//! being omitted, so every record serializes to the same shape.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Placeholder for a title that could not be located.
pub const TITLE_NOT_FOUND: &str = "Title Not Found";
/// Placeholder for a company name that could not be located.
pub const COMPANY_NOT_FOUND: &str = "Company Not Found";
/// Placeholder for a location that could not be located.
pub const LOCATION_NOT_FOUND: &str = "Location Not Found";
/// Placeholder for a salary that the posting does not publish.
pub const SALARY_NOT_AVAILABLE: &str = "Not Available";
/// Placeholder for a description with no recognizable qualifications section.
pub const DESCRIPTION_NOT_AVAILABLE: &str = "Not Available";

/// A single job listing scraped from one detail page.
///
/// Created exactly once per detail URL and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobRecord {
    /// The detail page this record was extracted from. Unique within a run.
    pub url: String,
    /// The posting's headline.
    pub title: String,
    /// The hiring company.
    pub company: String,
    /// Where the job is located, as the board displays it.
    pub location: String,
    /// The advertised pay, if any.
    pub salary: String,
    /// The qualifications/requirements lines, newline separated.
    pub description: String,
}

impl JobRecord {
    /// A record for `url` with every field set to its sentinel.
    ///
    /// Used when the detail page could not be loaded at all.
    pub fn unavailable(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: TITLE_NOT_FOUND.to_string(),
            company: COMPANY_NOT_FOUND.to_string(),
            location: LOCATION_NOT_FOUND.to_string(),
            salary: SALARY_NOT_AVAILABLE.to_string(),
            description: DESCRIPTION_NOT_AVAILABLE.to_string(),
        }
    }

    /// Number of fields that hold a real value rather than a sentinel.
    pub fn extracted_fields(&self) -> usize {
        [
            self.title != TITLE_NOT_FOUND,
            self.company != COMPANY_NOT_FOUND,
            self.location != LOCATION_NOT_FOUND,
            self.salary != SALARY_NOT_AVAILABLE,
            self.description != DESCRIPTION_NOT_AVAILABLE,
        ]
        .into_iter()
        .filter(|found| *found)
        .count()
    }
}

/// Provenance attached to every [`CrawlResult`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Metadata {
    /// The search URL the listings were discovered from.
    pub source: String,
    /// ISO-8601 time at which the result was assembled.
    pub timestamp: String,
}

/// Every listing found for one search query.
///
/// `data` is ordered by discovery on the search pages, which is not stable
/// across runs since the board's ranking changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrawlResult {
    /// The search term this result was crawled for.
    pub domain: String,
    /// The first search results page.
    #[serde(rename = "url")]
    pub source_url: String,
    /// Listings in discovery order.
    pub data: Vec<JobRecord>,
    /// Source and assembly timestamp.
    pub metadata: Metadata,
}

impl CrawlResult {
    /// Wrap `data` into a result stamped with the current local time.
    pub fn assemble(domain: &str, source_url: &str, data: Vec<JobRecord>) -> Self {
        Self {
            domain: domain.to_string(),
            source_url: source_url.to_string(),
            data,
            metadata: Metadata {
                source: source_url.to_string(),
                timestamp: Local::now().to_rfc3339(),
            },
        }
    }
}
