//! HTTP-backed rendering sessions.
//!
//! Each [`EngineKind`] stands for a browser identity: the session presents
//! itself with a user agent drawn at random from that browser's pool and
//! loads the server-rendered document over `reqwest`. Since the document is
//! static once loaded, waiting for an element is a single presence check,
//! and clicking an anchor follows its `href`.
//!
//! [`HttpSessionFactory`] tries the configured engines in order and hands out
//! the first one that initializes.

use super::{Session, SessionError, SessionFactory};
use crate::scrapers::locator::{any_present, Locator};
use clap::ValueEnum;
use rand::seq::IndexedRandom;
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const FIREFOX_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:97.0) Gecko/20100101 Firefox/97.0",
    "Mozilla/5.0 (X11; Fedora; Linux x86_64; rv:87.0) Gecko/20100101 Firefox/87.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:88.0) Gecko/20100101 Firefox/88.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux i686; rv:91.0) Gecko/20100101 Firefox/91.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:92.0) Gecko/20100101 Firefox/92.0",
];

const EDGE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.864.59 Safari/537.36 Edg/91.0.864.59",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.818.66 Safari/537.36 Edg/90.0.818.66",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.864.59 Safari/537.36 Edg/91.0.864.59",
];

const CHROME_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.51 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.82 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_2_3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.90 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.85 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.77 Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.3; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36",
];

/// A browser identity a session can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Firefox,
    Edge,
    Chrome,
}

impl EngineKind {
    /// Default preference order.
    pub const PREFERENCE: [EngineKind; 3] = [EngineKind::Firefox, EngineKind::Edge, EngineKind::Chrome];

    /// User agents this engine may present.
    pub fn user_agents(self) -> &'static [&'static str] {
        match self {
            EngineKind::Firefox => FIREFOX_AGENTS,
            EngineKind::Edge => EDGE_AGENTS,
            EngineKind::Chrome => CHROME_AGENTS,
        }
    }

    /// A user agent picked at random from [`EngineKind::user_agents`].
    pub fn random_user_agent(self) -> &'static str {
        self.user_agents()
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("Mozilla/5.0")
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineKind::Firefox => "firefox",
            EngineKind::Edge => "edge",
            EngineKind::Chrome => "chrome",
        };
        f.write_str(name)
    }
}

/// A session that loads pages with a dedicated HTTP client.
#[derive(Debug)]
pub struct HttpSession {
    engine: EngineKind,
    client: Client,
    current_url: Option<String>,
    source: Option<String>,
}

impl HttpSession {
    /// The engine this session was started with.
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    fn resolve(&self, href: &str) -> String {
        self.current_url
            .as_deref()
            .and_then(|base| Url::parse(base).ok())
            .and_then(|base| base.join(href).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| href.to_string())
    }
}

impl Session for HttpSession {
    #[instrument(level = "debug", skip(self), fields(engine = %self.engine))]
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.current_url = None;
        self.source = None;

        let navigation = |e: reqwest::Error| SessionError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(navigation)?;
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(navigation)?;

        debug!(%final_url, bytes = body.len(), "Page loaded");
        self.current_url = Some(final_url);
        self.source = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, locators: &[Locator], _timeout: Duration) -> bool {
        // The document does not change after load; presence is final.
        self.source
            .as_deref()
            .is_some_and(|html| any_present(html, locators))
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool, SessionError> {
        let href = match self.source.as_deref() {
            Some(html) => {
                let document = Html::parse_document(html);
                match locator.find(&document) {
                    Some(element) => match element.value().attr("href") {
                        Some(href) => href.to_string(),
                        None => {
                            debug!(?locator, "Control has no link target; cannot activate");
                            return Ok(false);
                        }
                    },
                    None => return Ok(false),
                }
            }
            None => return Ok(false),
        };

        let target = self.resolve(&href);
        self.goto(&target).await?;
        Ok(true)
    }

    fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    fn page_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    async fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.current_url = None;
        self.source = None;
        debug!(engine = %self.engine, "Session closed");
    }
}

/// Opens [`HttpSession`]s, trying engines in preference order.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    engines: Vec<EngineKind>,
    page_load_timeout: Duration,
}

impl HttpSessionFactory {
    pub fn new(engines: Vec<EngineKind>, page_load_timeout: Duration) -> Self {
        Self {
            engines,
            page_load_timeout,
        }
    }

    fn start(&self, engine: EngineKind) -> Result<HttpSession, reqwest::Error> {
        let client = Client::builder()
            .user_agent(engine.random_user_agent())
            .timeout(self.page_load_timeout)
            .build()?;
        Ok(HttpSession {
            engine,
            client,
            current_url: None,
            source: None,
        })
    }
}

impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, SessionError> {
        for engine in &self.engines {
            match self.start(*engine) {
                Ok(session) => {
                    debug!(engine = %session.engine(), "Session started");
                    return Ok(session);
                }
                Err(e) => warn!(%engine, error = %e, "Engine failed to start; trying next"),
            }
        }

        let tried = self
            .engines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!(%tried, "No rendering engine available");
        Err(SessionError::NoSupportedEngine { tried })
    }
}
