//! # Job Listings Scraper
//!
//! Crawls a paginated job board for one or more search queries, fetches the
//! detail page of every listing found, and writes normalized records to JSON.
//!
//! ## Features
//!
//! - Pagination bounded by a page ceiling, with URL de-duplication
//! - Ordered fallback locator chains per field, configurable in YAML
//! - Keyword-anchored extraction of the qualifications/requirements section
//! - Concurrent detail fetching, each on its own session
//! - Optional robots.txt gate
//!
//! ## Usage
//!
//! ```sh
//! job_listings_scraper -d "Software Engineer" -l Philadelphia -p 2 -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Crawling**: Walk the search results and collect detail URLs
//! 2. **Fetching**: Scrape every detail page (parallel, `workers` at a time)
//! 3. **Assembly**: Wrap each query's records with source and timestamp
//! 4. **Output**: Write `combined_jobs.json`

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod models;
mod outputs;
mod pipeline;
mod robots;
mod scrapers;
mod session;
mod utils;

use cli::Cli;
use outputs::json;
use pipeline::Pipeline;
use robots::RobotsGate;
use session::HttpSessionFactory;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_listings_scraper starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Load config & apply CLI overrides ----
    let mut site = config::load_config(args.config.as_deref()).await?;
    if let Some(workers) = args.workers {
        site.workers = workers;
    }
    if !args.engines.is_empty() {
        site.engines = args.engines.clone();
    }
    site.validate()?;
    let segmenter = site.segmenter()?;

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Build pipeline ----
    let factory = HttpSessionFactory::new(site.engines.clone(), site.page_load_timeout());
    let robots = if args.respect_robots {
        Some(RobotsGate::new(&site.robots_user_agent, Duration::from_secs(10))?)
    } else {
        None
    };
    let mut pipeline = Pipeline::new(factory, site, segmenter);
    if let Some(gate) = robots {
        pipeline = pipeline.with_robots(gate);
    }

    // ---- Crawl & scrape ----
    let results = match pipeline
        .run(&args.domains, &args.location, args.max_pages as usize)
        .await
    {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Scraping aborted");
            return Err(e.into());
        }
    };

    let total_records: usize = results.iter().map(|r| r.data.len()).sum();
    info!(
        domains = results.len(),
        records = total_records,
        "Scraping complete"
    );

    // ---- Output ----
    let path = json::write_results(&results, &args.output_dir).await?;
    info!(path = %path.display(), "Results saved");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
