//! JSON output for crawl results.
//!
//! The whole run is written as one array with one entry per query, each in
//! the shape `{domain, url, data: [JobRecord...], metadata: {source, timestamp}}`.

use crate::models::CrawlResult;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Name of the file every run writes into the output directory.
pub const COMBINED_FILE_NAME: &str = "combined_jobs.json";

/// Write `results` as pretty-printed JSON to `{output_dir}/combined_jobs.json`.
///
/// Creates the output directory if needed and overwrites any previous file.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_results(
    results: &[CrawlResult],
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(results)?;

    info!(%output_dir, "Ensuring output directory exists");
    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = Path::new(output_dir).join(COMBINED_FILE_NAME);
    fs::write(&path, json).await?;

    let records: usize = results.iter().map(|r| r.data.len()).sum();
    info!(path = %path.display(), domains = results.len(), records, "Wrote JSON output");
    Ok(path)
}
