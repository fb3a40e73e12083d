//! Run coordinator - per-target pipeline and run lifecycle
//!
//! This module drives one run over the configured targets:
//! - Initializing the fetcher, extractor and storage
//! - Processing targets strictly one at a time in shuffled order
//! - Writing exactly one request log entry per processed target
//! - Pacing between targets
//! - Draining on interrupt and releasing every resource on exit

use crate::config::{Config, DelayRange};
use crate::crawler::fetcher::{FetchSettings, Fetcher};
use crate::crawler::session::ChromeLauncher;
use crate::crawler::pause;
use crate::extract::{is_catalog_page, Extractor, ParsedDocument};
use crate::robots::RobotsGate;
use crate::rotation::{EndpointRotator, HttpProbe};
use crate::storage::{RequestStatus, SqliteStorage, Storage};
use crate::GleanerError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Collaborators constructed, browser starting
    Init,
    /// Processing targets
    Running,
    /// Interrupted: the current target finished, no new target starts
    Draining,
    /// Fetcher and storage released
    Done,
}

/// Totals for a finished run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Targets scheduled for the run
    pub targets: usize,
    /// Targets that were processed and logged
    pub processed: usize,
    pub by_status: BTreeMap<RequestStatus, u64>,
    /// True if the run stopped because of a cancellation request
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(targets: usize) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    fn record(&mut self, status: RequestStatus) {
        self.processed += 1;
        *self.by_status.entry(status).or_insert(0) += 1;
    }

    /// Number of targets logged with `status`
    pub fn count(&self, status: RequestStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Main run coordinator structure
pub struct Coordinator {
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
    storage: Box<dyn Storage + Send>,
    robots: Option<RobotsGate>,
    pacing: DelayRange,
    rng: StdRng,
    cancel: CancellationToken,
    phase: RunPhase,
}

impl Coordinator {
    /// Assembles a coordinator from its collaborators
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetcher owning the browser session
    /// * `extractor` - Strategy dispatch for fetched pages
    /// * `storage` - Persistence for content, records and the request log
    /// * `robots` - Optional robots.txt gate consulted before each fetch
    /// * `pacing` - Delay range slept between targets
    /// * `rng` - Source for target order and pacing
    /// * `cancel` - Token observed at every target boundary and sleep
    pub fn new(
        fetcher: Fetcher,
        extractor: Extractor,
        storage: Box<dyn Storage + Send>,
        robots: Option<RobotsGate>,
        pacing: DelayRange,
        rng: StdRng,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            storage,
            robots,
            pacing,
            rng,
            cancel,
            phase: RunPhase::Init,
        }
    }

    /// Builds the production coordinator for `config`
    ///
    /// Opens the database, validates relay endpoints and prepares a headless
    /// Chrome launcher. The browser itself starts in [`run`](Self::run).
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(GleanerError)` - The database or HTTP client could not be created
    pub async fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self, GleanerError> {
        let mut rng = match config.scraper.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

        let probe = HttpProbe::new(
            config.relay.probe_url.clone(),
            Duration::from_secs(config.relay.probe_timeout),
        );
        let endpoints = EndpointRotator::validate(
            config.relay.endpoints.clone(),
            &probe,
            StdRng::seed_from_u64(rng.random()),
        )
        .await;

        let fetcher = Fetcher::new(
            Box::new(ChromeLauncher),
            endpoints,
            FetchSettings::from_config(config),
            StdRng::seed_from_u64(rng.random()),
            cancel.clone(),
        );

        let robots = if config.scraper.respect_robots_txt {
            Some(RobotsGate::new(
                config.scraper.robots_agent.clone(),
                Duration::from_secs(config.scraper.wait_timeout),
            )?)
        } else {
            None
        };

        Ok(Self::new(
            fetcher,
            Extractor::new(),
            Box::new(storage),
            robots,
            config.pacing.between_targets,
            rng,
            cancel,
        ))
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Processes every target once, in shuffled order
    ///
    /// Each processed target produces exactly one request log entry. No
    /// single target failure stops the run. On cancellation the target in
    /// flight completes, no further target starts, and the run drains.
    /// The fetcher and storage are always released before returning, so a
    /// coordinator runs once.
    pub async fn run(&mut self, targets: &[String]) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new(targets.len());

        self.set_phase(RunPhase::Init);
        let mut order = targets.to_vec();
        order.shuffle(&mut self.rng);

        if !order.is_empty() && !self.cancel.is_cancelled() {
            if let Err(e) = self.fetcher.start().await {
                tracing::error!("Failed to start browser session, retrying on first fetch: {}", e);
            }
        }

        self.set_phase(RunPhase::Running);
        for (index, url) in order.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            tracing::info!(url = %url, "Processing target {}/{}", index + 1, order.len());
            let (status, bytes) = match self.process_target(url).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(url = %url, "Unexpected error processing target: {}", e);
                    (RequestStatus::Error, 0)
                }
            };

            self.storage.log_request(url, status, bytes);
            summary.record(status);
            tracing::info!(url = %url, %status, bytes, "Target finished");

            if index + 1 < order.len() {
                let delay = self.pacing.sample(&mut self.rng);
                tracing::debug!(delay_secs = delay.as_secs_f64(), "Pacing before next target");
                pause(delay, &self.cancel).await;
            }
        }

        if summary.processed < summary.targets {
            summary.interrupted = true;
            self.set_phase(RunPhase::Draining);
            tracing::warn!(
                remaining = summary.targets - summary.processed,
                "Run interrupted, skipping remaining targets"
            );
        }

        self.shutdown().await;
        self.set_phase(RunPhase::Done);

        summary.elapsed = started.elapsed();
        summary
    }

    /// Runs the pipeline for one target and returns what to log
    async fn process_target(&mut self, url: &str) -> Result<(RequestStatus, u64), GleanerError> {
        if let Some(robots) = self.robots.as_mut() {
            if !robots.is_allowed(url).await {
                tracing::warn!(url, "Target disallowed by robots.txt");
                return Ok((RequestStatus::Failed, 0));
            }
        }

        let content = match self.fetcher.fetch(url).await.content {
            Some(content) => content,
            None => return Ok((RequestStatus::Failed, 0)),
        };
        let bytes = content.len() as u64;

        let extractor = Arc::clone(&self.extractor);
        let source = url.to_string();
        let parsed = tokio::task::spawn_blocking(move || extractor.extract(&content, &source)).await?;

        let document = match parsed {
            Some(document) => document,
            None => return Ok((RequestStatus::ParseFailed, bytes)),
        };

        if self.persist(url, &document) {
            Ok((RequestStatus::Success, bytes))
        } else {
            Ok((RequestStatus::SaveFailed, bytes))
        }
    }

    /// Saves the document and, for the catalog page, its records
    fn persist(&mut self, url: &str, document: &ParsedDocument) -> bool {
        if let Err(e) = self.storage.save_content(
            url,
            &document.domain,
            &document.title,
            &document.content,
            &document.links,
        ) {
            tracing::error!(url, "Failed to save content: {}", e);
            return false;
        }

        if is_catalog_page(url) && !document.records.is_empty() {
            match self.storage.save_records(&document.records, url) {
                Ok(count) => tracing::info!(url, count, "Saved catalog records"),
                Err(e) => {
                    tracing::error!(url, "Failed to save catalog records: {}", e);
                    return false;
                }
            }
        }

        true
    }

    async fn shutdown(&mut self) {
        self.fetcher.close().await;
        if let Err(e) = self.storage.close() {
            tracing::error!("Error closing storage: {}", e);
        }
    }

    fn set_phase(&mut self, phase: RunPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "Run phase change");
        self.phase = phase;
    }
}
