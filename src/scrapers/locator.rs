//! Element locators and ordered-fallback field extraction.
//!
//! Job boards ship several markup variants of the same page (the location
//! line alone has appeared under at least two class names). Rather than
//! hard-coding one selector per field, each field is given a chain of
//! [`Locator`]s that are tried in priority order. Chains are plain data and
//! can be supplied from the YAML site configuration.
//!
//! # Locator kinds
//!
//! | YAML `by` | Meaning | CSS produced |
//! |-----------|---------|--------------|
//! | `id` | element id | `#value` |
//! | `class` | every listed class (space or dot separated) | `.a.b` |
//! | `class_contains` | class attribute substring | `[class*='value']` |
//! | `css` | structural path, passed through | `value` |

use crate::utils::normalize_whitespace;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A rule for selecting an element within a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    Class(String),
    ClassContains(String),
    Css(String),
}

impl Locator {
    /// Render this locator as a CSS selector string.
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{}", id.trim()),
            Locator::Class(classes) => classes
                .split(|c: char| c == '.' || c.is_whitespace())
                .filter(|class| !class.is_empty())
                .map(|class| format!(".{class}"))
                .collect(),
            Locator::ClassContains(fragment) => {
                format!("[class*='{}']", fragment.replace('\'', "\\'"))
            }
            Locator::Css(css) => css.clone(),
        }
    }

    /// Compile the locator, or `None` if it does not form a valid selector.
    pub fn selector(&self) -> Option<Selector> {
        let css = self.to_css();
        match Selector::parse(&css) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(locator = ?self, %css, error = %e, "Invalid locator; skipping");
                None
            }
        }
    }

    /// First element in `document` matched by this locator.
    pub fn find<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let selector = self.selector()?;
        document.select(&selector).next()
    }

    /// First descendant of `scope` matched by this locator.
    pub fn find_within<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let selector = self.selector()?;
        scope.select(&selector).next()
    }

    /// Every element in `document` matched by this locator, in document order.
    pub fn find_all<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        match self.selector() {
            Some(selector) => document.select(&selector).collect(),
            None => Vec::new(),
        }
    }
}

/// Visible text of an element with whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// The first element matched by any locator in `strategies`, tried in order.
pub fn first_match<'a>(document: &'a Html, strategies: &[Locator]) -> Option<ElementRef<'a>> {
    strategies.iter().find_map(|locator| {
        let found = locator.find(document);
        if found.is_none() {
            debug!(locator = ?locator, "Locator matched nothing; trying next");
        }
        found
    })
}

/// Whether any locator in `strategies` matches an element of `html`.
pub fn any_present(html: &str, strategies: &[Locator]) -> bool {
    let document = Html::parse_document(html);
    first_match(&document, strategies).is_some()
}

/// Text of the first element found by `strategies`, or `fallback`.
///
/// An element that is present but has no text counts as found and yields an
/// empty string; only when every locator misses is `fallback` returned.
pub fn extract_field(document: &Html, strategies: &[Locator], fallback: &str) -> String {
    match first_match(document, strategies) {
        Some(element) => element_text(element),
        None => fallback.to_string(),
    }
}
