//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files so targets a host
//! disallows are never fetched.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Per-run robots.txt gate, caching one parsed file per origin
pub struct RobotsGate {
    client: Client,
    agent: String,
    cache: HashMap<String, ParsedRobots>,
}

impl RobotsGate {
    /// Creates a gate matching rules for `agent`
    ///
    /// # Arguments
    ///
    /// * `agent` - The agent token matched against `User-agent` groups
    /// * `timeout` - Timeout for each robots.txt request
    pub fn new(agent: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let agent = agent.into();
        let client = Client::builder()
            .user_agent(agent.clone())
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            agent,
            cache: HashMap::new(),
        })
    }

    /// Checks whether `url` may be fetched
    ///
    /// Unparseable URLs are allowed here and left to fail at fetch time.
    pub async fn is_allowed(&mut self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return true,
        };

        let origin = parsed.origin().ascii_serialization();
        if !self.cache.contains_key(&origin) {
            let robots = fetch_robots(&self.client, &parsed).await;
            self.cache.insert(origin.clone(), robots);
        } else {
            tracing::debug!(origin = %origin, "Using cached robots.txt");
        }

        self.cache
            .get(&origin)
            .map_or(true, |robots| robots.is_allowed(url, &self.agent))
    }
}

/// Fetches robots.txt for the origin of `url`
///
/// # Returns
///
/// The parsed file, or an allow-all policy when the file is missing,
/// unreachable or returned a non-success status.
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(robots_url) => robots_url,
        Err(_) => return ParsedRobots::allow_all(),
    };

    tracing::debug!(url = %robots_url, "Fetching robots.txt");
    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %robots_url, "Failed to fetch robots.txt, allowing all: {}", e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            url = %robots_url,
            status = response.status().as_u16(),
            "No usable robots.txt, allowing all"
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!(url = %robots_url, "Failed to read robots.txt body, allowing all: {}", e);
            ParsedRobots::allow_all()
        }
    }
}
