//! Rendering sessions used to load search and detail pages.
//!
//! The scrapers never talk to the network directly. They drive a [`Session`]
//! (navigate, wait for an element, read the page, click) obtained from a
//! [`SessionFactory`]. The factory decides which rendering engine backs the
//! session, trying engines in a configured preference order.
//!
//! # Lifecycle
//!
//! A session is owned by exactly one task. The crawler keeps one session for
//! the whole run; every detail fetch opens its own and closes it when done,
//! so concurrent fetches never observe each other's navigation state.
//!
//! Callers hold sessions through a [`SessionGuard`]. Closing the guard is the
//! normal path; if it is dropped instead (a panic, a cancelled task) the
//! session is released synchronously.
//!
//! # Errors
//!
//! [`SessionError::NoSupportedEngine`] is the only fatal error: without a
//! session no page can be loaded. Navigation failures are reported to the
//! caller, which degrades to sentinel values.

pub mod http;

use crate::scrapers::locator::Locator;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub use http::{EngineKind, HttpSessionFactory};

/// Failures surfaced by a rendering session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Every engine in the preference order failed to start.
    #[error("no supported rendering engine could be started (tried: {tried})")]
    NoSupportedEngine { tried: String },

    /// A page could not be loaded.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
}

impl SessionError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::NoSupportedEngine { .. })
    }
}

/// A private browsing context able to load and inspect one page at a time.
pub trait Session {
    /// Load `url`, replacing the current page.
    async fn goto(&mut self, url: &str) -> Result<(), SessionError>;

    /// Wait up to `timeout` for an element matching any of `locators`.
    ///
    /// Returns `false` when the wait timed out; this is never an error.
    async fn wait_for(&mut self, locators: &[Locator], timeout: Duration) -> bool;

    /// Activate the element found by `locator`.
    ///
    /// Returns `Ok(false)` when no such element exists on the current page.
    async fn click(&mut self, locator: &Locator) -> Result<bool, SessionError>;

    /// URL of the page currently loaded, after redirects.
    fn current_url(&self) -> Option<&str>;

    /// Markup of the page currently loaded.
    fn page_source(&self) -> Option<&str>;

    /// Release the session.
    async fn close(self);

    /// Release the session without awaiting, for sessions abandoned mid-use.
    fn release(&mut self);
}

/// Opens sessions on demand.
pub trait SessionFactory {
    type Session: Session;

    /// Start a new, independent session.
    async fn open(&self) -> Result<Self::Session, SessionError>;
}

/// Owns a session and guarantees it is released exactly once.
///
/// ```ignore
/// let mut session = SessionGuard::new(factory.open().await?);
/// session.goto(url).await?;
/// session.close().await;
/// ```
#[derive(Debug)]
pub struct SessionGuard<S: Session> {
    session: Option<S>,
}

impl<S: Session> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Close the session, consuming the guard.
    pub async fn close(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

impl<S: Session> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.session
            .as_ref()
            .expect("session is present until the guard is closed")
    }
}

impl<S: Session> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        self.session
            .as_mut()
            .expect("session is present until the guard is closed")
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            warn!("Session abandoned without close; releasing");
            session.release();
        }
    }
}

#[cfg(test)]
pub mod fake {
    //! In-memory session backed by a fixed set of pages.

    use super::{Session, SessionError, SessionFactory};
    use crate::scrapers::locator::{any_present, Locator};
    use scraper::Html;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use url::Url;

    /// Shared bookkeeping so tests can inspect what sessions did.
    #[derive(Debug, Default)]
    pub struct Journal {
        pub visits: Mutex<Vec<String>>,
        pub opened: AtomicUsize,
        pub closed: AtomicUsize,
    }

    impl Journal {
        pub fn visits(&self) -> Vec<String> {
            self.visits.lock().unwrap().clone()
        }

        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        pub fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    pub struct FakeSession {
        pages: Arc<HashMap<String, String>>,
        journal: Arc<Journal>,
        delays: Arc<HashMap<String, Duration>>,
        panic_on: Option<String>,
        current: Option<(String, String)>,
    }

    impl Session for FakeSession {
        async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
            self.journal.visits.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            match self.pages.get(url) {
                Some(html) => {
                    self.current = Some((url.to_string(), html.clone()));
                    Ok(())
                }
                None => {
                    self.current = None;
                    Err(SessionError::Navigation {
                        url: url.to_string(),
                        reason: "404 Not Found".to_string(),
                    })
                }
            }
        }

        async fn wait_for(&mut self, locators: &[Locator], _timeout: Duration) -> bool {
            if self.panic_on.is_some() && self.current_url() == self.panic_on.as_deref() {
                panic!("renderer crashed");
            }
            self.page_source()
                .is_some_and(|html| any_present(html, locators))
        }

        async fn click(&mut self, locator: &Locator) -> Result<bool, SessionError> {
            let Some((url, html)) = &self.current else {
                return Ok(false);
            };
            let href = {
                let document = Html::parse_document(html);
                locator
                    .find(&document)
                    .and_then(|el| el.value().attr("href").map(str::to_string))
            };
            let Some(href) = href else {
                return Ok(false);
            };
            let target = Url::parse(url)
                .and_then(|base| base.join(&href))
                .map(|u| u.to_string())
                .unwrap_or(href);
            self.goto(&target).await.map(|_| true)
        }

        fn current_url(&self) -> Option<&str> {
            self.current.as_ref().map(|(url, _)| url.as_str())
        }

        fn page_source(&self) -> Option<&str> {
            self.current.as_ref().map(|(_, html)| html.as_str())
        }

        async fn close(self) {
            self.journal.closed.fetch_add(1, Ordering::SeqCst);
        }

        fn release(&mut self) {
            self.journal.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Default)]
    pub struct FakeFactory {
        pub pages: Arc<HashMap<String, String>>,
        pub delays: Arc<HashMap<String, Duration>>,
        pub panic_on: Option<String>,
        pub journal: Arc<Journal>,
        pub unavailable: bool,
    }

    impl FakeFactory {
        pub fn new<I, K, V>(pages: I) -> Self
        where
            I: IntoIterator<Item = (K, V)>,
            K: Into<String>,
            V: Into<String>,
        {
            Self {
                pages: Arc::new(
                    pages
                        .into_iter()
                        .map(|(k, v)| (k.into(), v.into()))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        pub fn with_delays<I>(mut self, delays: I) -> Self
        where
            I: IntoIterator<Item = (String, Duration)>,
        {
            self.delays = Arc::new(delays.into_iter().collect());
            self
        }

        /// Sessions panic while waiting on `url`.
        pub fn with_panic_on(mut self, url: &str) -> Self {
            self.panic_on = Some(url.to_string());
            self
        }

        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn session(&self) -> FakeSession {
            self.journal.opened.fetch_add(1, Ordering::SeqCst);
            FakeSession {
                pages: Arc::clone(&self.pages),
                journal: Arc::clone(&self.journal),
                delays: Arc::clone(&self.delays),
                panic_on: self.panic_on.clone(),
                current: None,
            }
        }
    }

    impl SessionFactory for FakeFactory {
        type Session = FakeSession;

        async fn open(&self) -> Result<FakeSession, SessionError> {
            if self.unavailable {
                return Err(SessionError::NoSupportedEngine {
                    tried: "fake".to_string(),
                });
            }
            Ok(self.session())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_engine_is_fatal() {
        let fatal = SessionError::NoSupportedEngine {
            tried: "firefox, edge, chrome".to_string(),
        };
        let nav = SessionError::Navigation {
            url: "https://example.com".to_string(),
            reason: "timed out".to_string(),
        };
        assert!(fatal.is_fatal());
        assert!(!nav.is_fatal());
        assert_eq!(
            fatal.to_string(),
            "no supported rendering engine could be started (tried: firefox, edge, chrome)"
        );
        assert_eq!(nav.to_string(), "navigation to https://example.com failed: timed out");
    }

    #[tokio::test]
    async fn test_fake_click_follows_relative_link() {
        let factory = fake::FakeFactory::new([
            (
                "https://jobs.test/search",
                r#"<a aria-label="Next" href="/search?start=10">Next</a>"#,
            ),
            ("https://jobs.test/search?start=10", "<p>page 2</p>"),
        ]);
        let mut session = factory.open().await.unwrap();
        session.goto("https://jobs.test/search").await.unwrap();
        let clicked = session
            .click(&Locator::Css("a[aria-label='Next']".into()))
            .await
            .unwrap();
        assert!(clicked);
        assert_eq!(session.current_url(), Some("https://jobs.test/search?start=10"));
        session.close().await;
        assert_eq!(factory.journal.closed(), 1);
    }

    #[tokio::test]
    async fn test_guard_close_releases_once() {
        let factory = fake::FakeFactory::new([("https://jobs.test/a", "<p>a</p>")]);
        let mut guard = SessionGuard::new(factory.open().await.unwrap());
        guard.goto("https://jobs.test/a").await.unwrap();
        assert_eq!(guard.current_url(), Some("https://jobs.test/a"));
        guard.close().await;
        assert_eq!(factory.journal.closed(), 1);
    }

    #[tokio::test]
    async fn test_dropped_guard_releases_session() {
        let factory = fake::FakeFactory::new(Vec::<(String, String)>::new());
        {
            let _guard = SessionGuard::new(factory.open().await.unwrap());
        }
        assert_eq!(factory.journal.opened(), 1);
        assert_eq!(factory.journal.closed(), 1);
    }
}
