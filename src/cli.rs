//! Command-line interface definitions for the job listings scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Values given here override the site configuration file.

use crate::session::EngineKind;
use clap::Parser;

/// Command-line arguments for the job listings scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape the first results page for the default query
/// job_listings_scraper -l Philadelphia
///
/// # Two queries, three pages each, custom output directory
/// job_listings_scraper -d "Software Engineer" -d Healthcare -l Philadelphia -p 3 -o ./out
///
/// # Custom selectors and engine order, honoring robots.txt
/// job_listings_scraper -c site.yaml --engines chrome,firefox --respect-robots
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search query to crawl; repeat for several queries
    #[arg(short, long = "domain", default_value = "Software Engineer")]
    pub domains: Vec<String>,

    /// Location to search in
    #[arg(short, long, default_value = "")]
    pub location: String,

    /// Maximum number of search results pages per query
    #[arg(short = 'p', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Output directory for the JSON file
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Optional path to a site configuration YAML file
    #[arg(short, long, env = "JOB_SCRAPER_CONFIG")]
    pub config: Option<String>,

    /// Number of detail pages fetched concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Rendering engines in preference order, comma separated
    #[arg(long, value_enum, value_delimiter = ',')]
    pub engines: Vec<EngineKind>,

    /// Skip queries whose search URL robots.txt disallows
    #[arg(long)]
    pub respect_robots: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["job_listings_scraper"]);

        assert_eq!(cli.domains, vec!["Software Engineer".to_string()]);
        assert_eq!(cli.location, "");
        assert_eq!(cli.max_pages, 1);
        assert_eq!(cli.output_dir, "output");
        assert!(cli.workers.is_none());
        assert!(cli.engines.is_empty());
        assert!(!cli.respect_robots);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "job_listings_scraper",
            "-d",
            "Healthcare",
            "-d",
            "Data Analyst",
            "-l",
            "Philadelphia",
            "-p",
            "3",
            "-o",
            "/tmp/jobs",
            "-w",
            "8",
        ]);

        assert_eq!(cli.domains, vec!["Healthcare".to_string(), "Data Analyst".to_string()]);
        assert_eq!(cli.location, "Philadelphia");
        assert_eq!(cli.max_pages, 3);
        assert_eq!(cli.output_dir, "/tmp/jobs");
        assert_eq!(cli.workers, Some(8));
    }

    #[test]
    fn test_cli_engines_list() {
        let cli = Cli::parse_from(["job_listings_scraper", "--engines", "chrome,firefox"]);
        assert_eq!(cli.engines, vec![EngineKind::Chrome, EngineKind::Firefox]);
    }

    #[test]
    fn test_cli_rejects_zero_pages() {
        assert!(Cli::try_parse_from(["job_listings_scraper", "-p", "0"]).is_err());
    }
}
