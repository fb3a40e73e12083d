//! Relay endpoint validation and rotation

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Checks whether a relay endpoint can reach the outside world
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    /// Returns true if a request routed through `endpoint` succeeded
    async fn probe(&self, endpoint: &str) -> bool;
}

/// Probes an endpoint by routing a GET to a fixed target through it
#[derive(Debug, Clone)]
pub struct HttpProbe {
    target: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            timeout,
        }
    }

    async fn try_probe(&self, endpoint: &str) -> Result<reqwest::StatusCode, reqwest::Error> {
        let client = Client::builder()
            .proxy(Proxy::all(endpoint)?)
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()?;

        let response = client.get(&self.target).send().await?;
        Ok(response.status())
    }
}

#[async_trait]
impl EndpointProbe for HttpProbe {
    async fn probe(&self, endpoint: &str) -> bool {
        match self.try_probe(endpoint).await {
            Ok(status) if status.is_success() => {
                tracing::info!(endpoint, "Relay endpoint validated");
                true
            }
            Ok(status) => {
                tracing::warn!(endpoint, status = status.as_u16(), "Relay endpoint returned non-success status");
                false
            }
            Err(e) => {
                tracing::warn!(endpoint, "Relay endpoint failed to connect: {}", e);
                false
            }
        }
    }
}

/// Supplies one relay endpoint per browser session
///
/// Candidates are probed once at construction. If every probe fails the
/// rotator keeps the original, unvalidated list: a broken probe target must
/// not silently turn rotation off. With no candidates at all, `next` returns
/// `None`, meaning "connect directly".
#[derive(Debug)]
pub struct EndpointRotator {
    active: Vec<String>,
    validated: bool,
    rng: StdRng,
}

impl EndpointRotator {
    /// Probes every candidate and keeps the ones that answered
    pub async fn validate(candidates: Vec<String>, probe: &dyn EndpointProbe, rng: StdRng) -> Self {
        if candidates.is_empty() {
            tracing::info!("No relay endpoints configured, using direct connections");
            return Self::direct(rng);
        }

        let mut valid = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if probe.probe(candidate).await {
                valid.push(candidate.clone());
            }
        }

        if valid.is_empty() {
            tracing::warn!(
                candidates = candidates.len(),
                "No relay endpoint passed validation, falling back to the unvalidated list"
            );
            Self {
                active: candidates,
                validated: false,
                rng,
            }
        } else {
            tracing::info!(
                valid = valid.len(),
                candidates = candidates.len(),
                "Relay endpoints validated"
            );
            Self {
                active: valid,
                validated: true,
                rng,
            }
        }
    }

    /// A rotator that never routes through a relay
    pub fn direct(rng: StdRng) -> Self {
        Self {
            active: Vec::new(),
            validated: true,
            rng,
        }
    }

    /// Returns a random endpoint, or `None` to connect directly
    pub fn next(&mut self) -> Option<String> {
        self.active.choose(&mut self.rng).cloned()
    }

    /// The endpoints currently in rotation
    pub fn active(&self) -> &[String] {
        &self.active
    }

    /// False when rotation fell back to the unvalidated candidate list
    pub fn is_validated(&self) -> bool {
        self.validated
    }
}
