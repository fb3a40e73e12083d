//! Browser-driven fetcher
//!
//! This module owns the single browser session of a run and implements the
//! retry pipeline around it:
//! - Randomized pre-navigation delay
//! - Host-aware readiness waits
//! - Lazy-load scrolling
//! - Content-size validity gate
//! - Exponential backoff with jitter between attempts
//! - Session restart (new identity and relay) after repeated session errors

use crate::config::{Config, DelayRange};
use crate::crawler::session::{BrowserSession, ScrollPosition, SessionLauncher, SessionOptions};
use crate::crawler::{pause, SessionError};
use crate::extract::CATALOG_HOST;
use crate::rotation::{EndpointRotator, IdentityPool};
use crate::url::host_of;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Primary readiness marker on the catalog host
const CATALOG_READY_MARKER: &str = ".ipc-metadata-list";

/// Readiness marker for the legacy catalog layout
const CATALOG_FALLBACK_MARKER: &str = ".lister-list, [data-testid=\"chart-layout-main-column\"]";

/// Consecutive session errors that trigger a session restart
const SESSION_RESTART_THRESHOLD: u32 = 2;

/// Tunables for [`Fetcher`], derived from configuration
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub max_retries: u32,
    pub wait_timeout: Duration,
    pub headless: bool,
    /// Content must be strictly larger than this to count as a page
    pub min_content_bytes: usize,
    /// Backoff base in seconds
    pub base_delay: f64,
    pub pre_navigation: DelayRange,
    pub jitter: DelayRange,
    /// Pause after scrolling to the bottom
    pub scroll_pause: Duration,
    /// Pause after scrolling back to the top
    pub settle_pause: Duration,
    /// Interval between readiness checks
    pub poll_interval: Duration,
    pub window: (u32, u32),
}

impl FetchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.scraper.max_retries,
            wait_timeout: Duration::from_secs(config.scraper.wait_timeout),
            headless: config.scraper.headless,
            min_content_bytes: config.scraper.min_content_bytes,
            base_delay: config.scraper.base_delay,
            pre_navigation: config.pacing.pre_navigation,
            jitter: config.pacing.jitter,
            scroll_pause: Duration::from_secs(1),
            settle_pause: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            window: (1366, 768),
        }
    }
}

/// Result of a [`Fetcher::fetch`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Page markup, present only when an attempt passed the size gate
    pub content: Option<String>,
    /// Navigation attempts made
    pub attempts: u32,
}

impl FetchOutcome {
    fn failed(attempts: u32) -> Self {
        Self {
            content: None,
            attempts,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.content.is_some()
    }
}

/// Computes the sleep between attempt `attempt` and the next one
///
/// `base * 2^attempt` seconds plus a uniform jitter sample.
pub fn backoff_delay<R: Rng + ?Sized>(
    base: f64,
    attempt: u32,
    jitter: &DelayRange,
    rng: &mut R,
) -> Duration {
    let exponential = base * 2f64.powi(attempt.min(30) as i32);
    Duration::try_from_secs_f64(exponential.max(0.0))
        .unwrap_or(Duration::MAX)
        .saturating_add(jitter.sample(rng))
}

/// Fetches pages through one exclusively owned browser session
pub struct Fetcher {
    launcher: Box<dyn SessionLauncher>,
    session: Option<Box<dyn BrowserSession>>,
    identities: IdentityPool,
    endpoints: EndpointRotator,
    settings: FetchSettings,
    rng: StdRng,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Creates a fetcher; no browser is launched until [`start`](Self::start)
    /// or the first [`fetch`](Self::fetch)
    pub fn new(
        launcher: Box<dyn SessionLauncher>,
        endpoints: EndpointRotator,
        settings: FetchSettings,
        mut rng: StdRng,
        cancel: CancellationToken,
    ) -> Self {
        let identities = IdentityPool::new(StdRng::seed_from_u64(rng.random()));
        Self {
            launcher,
            session: None,
            identities,
            endpoints,
            settings,
            rng,
            cancel,
        }
    }

    /// Launches a session with a fresh identity and relay endpoint
    pub async fn start(&mut self) -> Result<(), SessionError> {
        let options = SessionOptions {
            identity: self.identities.next().to_string(),
            endpoint: self.endpoints.next(),
            headless: self.settings.headless,
            window: self.settings.window,
            request_timeout: self.settings.wait_timeout,
        };

        tracing::debug!(identity = %options.identity, "Launching browser session");
        let session = self.launcher.launch(&options).await?;
        self.session = Some(session);
        Ok(())
    }

    /// Returns true if a session is currently held
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Retrieves `url`, retrying up to `max_retries` navigation attempts
    ///
    /// # Returns
    ///
    /// A [`FetchOutcome`] whose `content` is `None` when every attempt failed,
    /// the session could not be (re)initialized, or the run was cancelled.
    pub async fn fetch(&mut self, url: &str) -> FetchOutcome {
        if self.session.is_none() {
            if let Err(e) = self.start().await {
                tracing::error!(url, "Browser session unavailable: {}", e);
                return FetchOutcome::failed(0);
            }
        }

        let host = host_of(url).unwrap_or_default();
        let max_retries = self.settings.max_retries;
        let mut consecutive_errors = 0;
        let mut attempts = 0;

        for attempt in 0..max_retries {
            if self.cancel.is_cancelled() {
                tracing::info!(url, "Fetch cancelled");
                break;
            }

            attempts = attempt + 1;
            match self.attempt(url, &host).await {
                Ok(Some(content)) => {
                    tracing::info!(url, attempt = attempts, bytes = content.len(), "Fetched page");
                    return FetchOutcome {
                        content: Some(content),
                        attempts,
                    };
                }
                Ok(None) => {
                    consecutive_errors = 0;
                    tracing::warn!(url, attempt = attempts, "Page content below size threshold");
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(url, attempt = attempts, "Fetch attempt failed: {}", e);

                    if consecutive_errors >= SESSION_RESTART_THRESHOLD && attempts < max_retries {
                        tracing::info!(url, "Restarting browser session after repeated errors");
                        if let Err(e) = self.restart().await {
                            tracing::error!(url, "Browser session restart failed: {}", e);
                            return FetchOutcome::failed(attempts);
                        }
                        consecutive_errors = 0;
                    }
                }
            }

            if attempts < max_retries {
                let delay = backoff_delay(
                    self.settings.base_delay,
                    attempt,
                    &self.settings.jitter,
                    &mut self.rng,
                );
                tracing::debug!(url, delay_secs = delay.as_secs_f64(), "Backing off");
                if !pause(delay, &self.cancel).await {
                    break;
                }
            }
        }

        tracing::error!(url, attempts, "Failed to fetch page");
        FetchOutcome::failed(attempts)
    }

    /// Releases the session; later fetches start a new one
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.close().await {
                Ok(()) => tracing::debug!("Browser session closed"),
                Err(e) => tracing::warn!("Error closing browser session: {}", e),
            }
        }
    }

    async fn restart(&mut self) -> Result<(), SessionError> {
        self.close().await;
        self.start().await
    }

    /// One navigation attempt; `Ok(None)` means the page was too small
    async fn attempt(&mut self, url: &str, host: &str) -> Result<Option<String>, SessionError> {
        let delay = self.settings.pre_navigation.sample(&mut self.rng);
        pause(delay, &self.cancel).await;

        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        session.navigate(url).await?;
        wait_until_ready(session.as_mut(), host, &self.settings, &self.cancel).await?;

        session.scroll(ScrollPosition::Bottom).await?;
        pause(self.settings.scroll_pause, &self.cancel).await;
        session.scroll(ScrollPosition::Top).await?;
        pause(self.settings.settle_pause, &self.cancel).await;

        let content = session.content().await?;
        if content.len() > self.settings.min_content_bytes {
            Ok(Some(content))
        } else {
            Ok(None)
        }
    }
}

/// Waits for the host-appropriate readiness signal
///
/// A timeout is not an error: the attempt proceeds with whatever loaded and
/// the size gate decides.
async fn wait_until_ready(
    session: &mut dyn BrowserSession,
    host: &str,
    settings: &FetchSettings,
    cancel: &CancellationToken,
) -> Result<(), SessionError> {
    if host.contains(CATALOG_HOST) {
        let primary_timeout = settings.wait_timeout * 2;
        if wait_for_element(session, CATALOG_READY_MARKER, primary_timeout, settings, cancel).await? {
            return Ok(());
        }

        tracing::warn!(host, "Catalog marker not found, waiting for legacy layout");
        if !wait_for_element(session, CATALOG_FALLBACK_MARKER, settings.wait_timeout, settings, cancel)
            .await?
        {
            tracing::warn!(host, "No catalog marker appeared, proceeding anyway");
        }
        return Ok(());
    }

    if !wait_for_element(session, "body", settings.wait_timeout, settings, cancel).await? {
        tracing::warn!(host, "Document body did not appear in time");
        return Ok(());
    }
    if !wait_for_document_complete(session, settings, cancel).await? {
        tracing::warn!(host, "Document did not finish loading in time");
    }
    Ok(())
}

async fn wait_for_element(
    session: &mut dyn BrowserSession,
    selector: &str,
    timeout: Duration,
    settings: &FetchSettings,
    cancel: &CancellationToken,
) -> Result<bool, SessionError> {
    let deadline = Instant::now() + timeout;
    loop {
        if session.has_element(selector).await? {
            return Ok(true);
        }
        if Instant::now() >= deadline || !pause(settings.poll_interval, cancel).await {
            return Ok(false);
        }
    }
}

async fn wait_for_document_complete(
    session: &mut dyn BrowserSession,
    settings: &FetchSettings,
    cancel: &CancellationToken,
) -> Result<bool, SessionError> {
    let deadline = Instant::now() + settings.wait_timeout;
    loop {
        if session.ready_state().await? == "complete" {
            return Ok(true);
        }
        if Instant::now() >= deadline || !pause(settings.poll_interval, cancel).await {
            return Ok(false);
        }
    }
}
