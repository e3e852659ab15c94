//! Output generation for scraped job listings.
//!
//! # Submodules
//!
//! - [`json`]: Writes the run's `CrawlResult`s to a JSON file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── combined_jobs.json   # [{domain, url, data: [...], metadata}, ...]
//! ```

pub mod json;
