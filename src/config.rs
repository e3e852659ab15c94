//! Site configuration: selectors, timeouts and worker settings.
//!
//! Everything that depends on the job board's markup lives here as data, so
//! a new markup variant is handled by adding a locator to a chain rather than
//! by touching control flow. The built-in defaults target Indeed.
//!
//! A YAML file may override any subset of keys:
//!
//! ```yaml
//! workers: 8
//! engines: [chrome, firefox]
//! detail:
//!   location:
//!     fallback: Location Not Found
//!     locators:
//!       - { by: class, value: "css-9yl11a eu4oa1w0" }
//!       - { by: class_contains, value: "jobLocation" }
//! ```

use crate::models::{
    COMPANY_NOT_FOUND, LOCATION_NOT_FOUND, SALARY_NOT_AVAILABLE, TITLE_NOT_FOUND,
};
use crate::scrapers::description::{Segmenter, DEFAULT_BULLETS, DEFAULT_KEYWORDS};
use crate::scrapers::locator::Locator;
use crate::session::EngineKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Everything needed to crawl and parse one job board.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Short name of the board, used in logs.
    pub source: String,
    /// Rendering engines in preference order.
    pub engines: Vec<EngineKind>,
    /// Upper bound on any single page load.
    pub page_load_timeout_secs: u64,
    /// Number of detail pages fetched concurrently.
    pub workers: usize,
    /// User agent used when consulting robots.txt.
    pub robots_user_agent: String,
    pub search: SearchConfig,
    pub detail: DetailConfig,
    pub description: DescriptionConfig,
}

/// How to walk the paginated search results.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search URL with `{query}` and `{location}` placeholders.
    pub url_template: String,
    /// How long to wait for job cards to appear on each results page.
    pub results_wait_secs: u64,
    /// One job card on a results page.
    pub card: Locator,
    /// The detail link inside a job card.
    pub card_link: Locator,
    /// The "next page" control.
    pub next_page: Locator,
}

/// Locator chains for the fields of a detail page.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetailConfig {
    /// How long to wait for the title before extracting anyway.
    pub wait_secs: u64,
    pub title: FieldConfig,
    pub company: FieldConfig,
    pub location: FieldConfig,
    pub salary: FieldConfig,
    /// Element holding the full posting text.
    pub description_container: Vec<Locator>,
}

/// A field's locator chain and the sentinel used when every locator misses.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldConfig {
    pub locators: Vec<Locator>,
    pub fallback: String,
}

/// Section keywords and bullet glyphs for the description segmenter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DescriptionConfig {
    pub keywords: Vec<String>,
    pub bullets: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source: "indeed".to_string(),
            engines: EngineKind::PREFERENCE.to_vec(),
            page_load_timeout_secs: 10,
            workers: 30,
            robots_user_agent: "*".to_string(),
            search: SearchConfig::default(),
            detail: DetailConfig::default(),
            description: DescriptionConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url_template: "https://www.indeed.com/jobs?q={query}&l={location}".to_string(),
            results_wait_secs: 10,
            card: Locator::Class("job_seen_beacon".to_string()),
            card_link: Locator::Css("a[data-jk]".to_string()),
            next_page: Locator::Css("a[aria-label='Next'], a[aria-label='Next Page']".to_string()),
        }
    }
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            wait_secs: 5,
            title: FieldConfig {
                locators: vec![
                    Locator::Css("h1[class*='jobsearch-JobInfoHeader-title']".to_string()),
                    Locator::Css("[data-testid='jobsearch-JobInfoHeader-title']".to_string()),
                ],
                fallback: TITLE_NOT_FOUND.to_string(),
            },
            company: FieldConfig {
                locators: vec![
                    Locator::Class("css-1saizt3 e1wnkr790".to_string()),
                    Locator::Css("[data-company-name='true']".to_string()),
                ],
                fallback: COMPANY_NOT_FOUND.to_string(),
            },
            location: FieldConfig {
                locators: vec![
                    Locator::Class("css-9yl11a eu4oa1w0".to_string()),
                    Locator::Class("css-ks9svk eu4oa1w0".to_string()),
                    Locator::ClassContains("css-9yl11a".to_string()),
                ],
                fallback: LOCATION_NOT_FOUND.to_string(),
            },
            salary: FieldConfig {
                locators: vec![Locator::Class("css-2iqe2o eu4oa1w0".to_string())],
                fallback: SALARY_NOT_AVAILABLE.to_string(),
            },
            description_container: vec![Locator::Id("jobDescriptionText".to_string())],
        }
    }
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            bullets: DEFAULT_BULLETS.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl SiteConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn results_wait(&self) -> Duration {
        Duration::from_secs(self.search.results_wait_secs)
    }

    pub fn detail_wait(&self) -> Duration {
        Duration::from_secs(self.detail.wait_secs)
    }

    /// Build the description segmenter described by this configuration.
    pub fn segmenter(&self) -> Result<Segmenter, regex::Error> {
        Segmenter::new(self.description.keywords.as_slice(), self.description.bullets.as_slice())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if !self.search.url_template.contains("{query}") {
            return Err("search.url_template must contain a {query} placeholder".into());
        }
        if self.workers == 0 {
            return Err("workers must be at least 1".into());
        }
        if self.engines.is_empty() {
            return Err("at least one rendering engine must be configured".into());
        }
        if self.detail.title.locators.is_empty() {
            return Err("detail.title needs at least one locator".into());
        }
        Ok(())
    }
}

/// Parse a YAML site configuration, filling missing keys with defaults.
pub fn parse_config(yaml: &str) -> Result<SiteConfig, Box<dyn Error>> {
    let config: SiteConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Load the site configuration from `path`, or the defaults when `None`.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<SiteConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using built-in defaults");
        return Ok(SiteConfig::default());
    };

    let yaml = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&yaml)?;
    info!(source = %config.source, workers = config.workers, "Loaded configuration");
    Ok(config)
}
