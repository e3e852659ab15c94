//! Best-effort robots.txt gate.
//!
//! Before crawling a query the pipeline may ask whether the search URL is
//! allowed for the configured user agent. The check never blocks a run on
//! its own failures: a robots.txt that cannot be fetched or parsed permits
//! the crawl.

use reqwest::Client;
use std::time::Duration;
use texting_robots::Robot;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Location of the robots.txt governing `url`.
pub fn robots_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
    Some(format!("{}://{}{}/robots.txt", parsed.scheme(), host, port))
}

/// Whether `robots_txt` lets `agent` fetch `url`.
///
/// Unparsable files permit everything.
pub fn allowed_by(robots_txt: &[u8], agent: &str, url: &str) -> bool {
    match Robot::new(agent, robots_txt) {
        Ok(robot) => robot.allowed(url),
        Err(e) => {
            debug!(error = %e, "robots.txt could not be parsed; allowing");
            true
        }
    }
}

/// Fetches robots.txt files and evaluates them for one user agent.
#[derive(Debug, Clone)]
pub struct RobotsGate {
    client: Client,
    user_agent: String,
}

impl RobotsGate {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    /// Whether crawling `url` is permitted.
    #[instrument(level = "info", skip(self))]
    pub async fn is_allowed(&self, url: &str) -> bool {
        let Some(robots) = robots_url(url) else {
            warn!("Cannot derive robots.txt location; allowing");
            return true;
        };

        let body = match self.client.get(&robots).send().await {
            Ok(response) if response.status().is_success() => response.bytes().await,
            Ok(response) => {
                info!(status = %response.status(), "No robots.txt served; allowing");
                return true;
            }
            Err(e) => {
                warn!(error = %e, "robots.txt unreachable; allowing");
                return true;
            }
        };

        match body {
            Ok(bytes) => allowed_by(&bytes, &self.user_agent, url),
            Err(e) => {
                warn!(error = %e, "robots.txt body unreadable; allowing");
                true
            }
        }
    }
}
