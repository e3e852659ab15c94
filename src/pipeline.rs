//! Run orchestration: crawl each query, fetch every listing, assemble results.
//!
//! For each query the [`Pipeline`]:
//! 1. Optionally consults robots.txt for the search URL, skipping the query on denial
//! 2. Crawls the search results on the run's crawl session
//! 3. Fetches the discovered detail pages on a bounded pool of workers
//! 4. Restores discovery order and stamps the [`CrawlResult`]
//!
//! Workers share nothing mutable: each detail fetch opens its own session.
//! Completion order inside the pool is arbitrary, but results are keyed by
//! discovery index, so output order depends only on the crawl.

use crate::config::SiteConfig;
use crate::models::{CrawlResult, JobRecord};
use crate::robots::RobotsGate;
use crate::scrapers::description::Segmenter;
use crate::scrapers::detail::fetch_detail;
use crate::scrapers::pagination::{crawl, search_url};
use crate::session::{SessionError, SessionFactory, SessionGuard};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Composes the crawler and detail fetchers for a set of queries.
#[derive(Debug)]
pub struct Pipeline<F> {
    factory: F,
    site: SiteConfig,
    segmenter: Segmenter,
    robots: Option<RobotsGate>,
}

impl<F: SessionFactory> Pipeline<F> {
    pub fn new(factory: F, site: SiteConfig, segmenter: Segmenter) -> Self {
        Self {
            factory,
            site,
            segmenter,
            robots: None,
        }
    }

    /// Consult `gate` before crawling each query.
    pub fn with_robots(mut self, gate: RobotsGate) -> Self {
        self.robots = Some(gate);
        self
    }

    /// Crawl and scrape every query in `domains`.
    ///
    /// # Errors
    ///
    /// Fails only when no rendering session can be started; everything else
    /// degrades into fewer URLs or sentinel fields.
    #[instrument(level = "info", skip(self))]
    pub async fn run(
        &self,
        domains: &[String],
        location: &str,
        max_pages: usize,
    ) -> Result<Vec<CrawlResult>, SessionError> {
        let mut crawl_session = SessionGuard::new(self.factory.open().await?);
        let mut results = Vec::with_capacity(domains.len());

        for domain in domains {
            match self.run_domain(&mut *crawl_session, domain, location, max_pages).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => {
                    error!(%domain, error = %e, fatal = e.is_fatal(), "Aborting run");
                    crawl_session.close().await;
                    return Err(e);
                }
            }
        }

        crawl_session.close().await;
        Ok(results)
    }

    #[instrument(level = "info", skip(self, session, location, max_pages))]
    async fn run_domain(
        &self,
        session: &mut F::Session,
        domain: &str,
        location: &str,
        max_pages: usize,
    ) -> Result<Option<CrawlResult>, SessionError> {
        let source_url = search_url(&self.site.search.url_template, domain, location);

        if let Some(gate) = &self.robots {
            if !gate.is_allowed(&source_url).await {
                warn!(url = %source_url, "Disallowed by robots.txt; skipping domain");
                return Ok(None);
            }
        }

        let t0 = Instant::now();
        let urls = crawl(
            session,
            &self.site.search,
            self.site.results_wait(),
            domain,
            location,
            max_pages,
        )
        .await;

        let data = self.fetch_all(&urls).await?;
        let result = CrawlResult::assemble(domain, &source_url, data);
        info!(
            records = result.data.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Domain complete"
        );
        Ok(Some(result))
    }

    /// Fetch every URL on the worker pool, returning records in `urls` order.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<Vec<JobRecord>, SessionError> {
        let workers = self.site.workers.max(1);
        info!(count = urls.len(), workers, "Fetching job details");

        let mut indexed: Vec<(usize, Result<JobRecord, SessionError>)> = stream::iter(urls.iter().enumerate())
            .map(|(i, url)| async move {
                (i, fetch_detail(&self.factory, &self.site, &self.segmenter, url).await)
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, record)| record).collect()
    }
}
