//! Output module for run reporting
//!
//! This module handles:
//! - Loading database-wide statistics
//! - Printing statistics and the summary of a finished run

pub mod stats;

pub use stats::{load_statistics, print_statistics, RunStatistics};

use crate::crawler::RunSummary;

/// Logs the completion line and per-status totals of a run
///
/// # Arguments
///
/// * `summary` - The summary returned by the coordinator
pub fn log_run_summary(summary: &RunSummary) {
    if summary.interrupted {
        tracing::warn!(
            processed = summary.processed,
            targets = summary.targets,
            "Scraping interrupted after {:.0} seconds",
            summary.elapsed.as_secs_f64()
        );
    } else {
        tracing::info!(
            processed = summary.processed,
            targets = summary.targets,
            "Scraping completed in {:.0} seconds",
            summary.elapsed.as_secs_f64()
        );
    }

    for (status, count) in &summary.by_status {
        tracing::info!(%status, count, "Targets by status");
    }
}
