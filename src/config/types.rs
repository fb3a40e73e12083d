use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
}

/// Fetch and retry behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Maximum navigation attempts per target
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-wait timeout for readiness markers (seconds)
    #[serde(rename = "wait-timeout", default = "default_wait_timeout")]
    pub wait_timeout: u64,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Pages at or below this size are treated as blank/error pages
    #[serde(rename = "min-content-bytes", default = "default_min_content_bytes")]
    pub min_content_bytes: usize,

    /// Base of the exponential backoff between attempts (seconds)
    #[serde(rename = "base-delay", default = "default_base_delay")]
    pub base_delay: f64,

    /// Consult robots.txt before fetching a target
    #[serde(rename = "respect-robots-txt", default = "default_respect_robots")]
    pub respect_robots_txt: bool,

    /// Agent token matched against robots.txt groups
    #[serde(rename = "robots-agent", default = "default_robots_agent")]
    pub robots_agent: String,

    /// Fixed seed for shuffle, jitter and rotation choices
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            wait_timeout: default_wait_timeout(),
            headless: default_headless(),
            min_content_bytes: default_min_content_bytes(),
            base_delay: default_base_delay(),
            respect_robots_txt: default_respect_robots(),
            robots_agent: default_robots_agent(),
            seed: None,
        }
    }
}

/// Randomized delay windows
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Sleep before each navigation
    #[serde(rename = "pre-navigation", default = "default_pre_navigation")]
    pub pre_navigation: DelayRange,

    /// Sleep between consecutive targets
    #[serde(rename = "between-targets", default = "default_between_targets")]
    pub between_targets: DelayRange,

    /// Jitter added on top of the exponential backoff
    #[serde(default = "default_jitter")]
    pub jitter: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            pre_navigation: default_pre_navigation(),
            between_targets: default_between_targets(),
            jitter: default_jitter(),
        }
    }
}

/// A closed interval of seconds sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that always yields zero
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Draws a duration uniformly from `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = if self.max > self.min {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        };
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Relay endpoint rotation
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Candidate relay endpoints (e.g. "http://10.0.0.5:3128")
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// URL each candidate is probed against at startup
    #[serde(rename = "probe-url", default = "default_probe_url")]
    pub probe_url: String,

    /// Probe timeout (seconds)
    #[serde(rename = "probe-timeout", default = "default_probe_timeout")]
    pub probe_timeout: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            probe_url: default_probe_url(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// The fixed list of pages to retrieve
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}

fn default_max_retries() -> u32 {
    5
}

fn default_wait_timeout() -> u64 {
    30
}

fn default_headless() -> bool {
    true
}

fn default_min_content_bytes() -> usize {
    1000
}

fn default_base_delay() -> f64 {
    2.0
}

fn default_respect_robots() -> bool {
    true
}

fn default_robots_agent() -> String {
    "gleaner".to_string()
}

fn default_pre_navigation() -> DelayRange {
    DelayRange::new(1.0, 3.0)
}

fn default_between_targets() -> DelayRange {
    DelayRange::new(2.0, 5.0)
}

fn default_jitter() -> DelayRange {
    DelayRange::new(0.5, 1.5)
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

fn default_probe_timeout() -> u64 {
    5
}
