//! Crawler module for browser-driven page retrieval
//!
//! This module contains the core harvesting logic, including:
//! - Browser session lifecycle behind the [`SessionLauncher`] seam
//! - Fetching with readiness waits, lazy-load scrolling and backoff
//! - Overall run coordination and the per-target pipeline

mod coordinator;
mod fetcher;
mod session;

pub use coordinator::{Coordinator, RunPhase, RunSummary};
pub use fetcher::{backoff_delay, FetchOutcome, FetchSettings, Fetcher};
pub use session::{
    BrowserSession, ChromeLauncher, ScrollPosition, SessionLauncher, SessionOptions,
};

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors raised by a browser session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Browser session is closed")]
    Closed,
}

/// Sleeps for `duration` unless `cancel` fires first
///
/// Returns `false` if the sleep was cut short by cancellation.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
