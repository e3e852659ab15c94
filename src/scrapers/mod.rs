//! Job board scraping: search crawling, detail fetching and field extraction.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Crawling** ([`pagination`]): walk the search results and collect the
//!    detail page URL of every job card
//! 2. **Fetching** ([`detail`]): load each detail page and turn it into a
//!    `JobRecord`
//!
//! # Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | [`locator`] | Locator chains and ordered-fallback field extraction |
//! | [`description`] | Keyword-anchored qualifications extraction |
//! | [`detail`] | One detail page on its own session |
//! | [`pagination`] | Sequential crawl of search results pages |
//!
//! Extraction never fails outright: a field that cannot be located falls back
//! to its sentinel value.

pub mod description;
pub mod detail;
pub mod locator;
pub mod pagination;
