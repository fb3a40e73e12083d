//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! totals from the storage layer.

use crate::storage::{RequestStatus, Storage, StorageResult};
use std::collections::BTreeMap;

/// Database-wide totals across all runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Rows in the content table
    pub content_rows: u64,

    /// Rows in the catalog records table
    pub catalog_records: u64,

    /// Request log entries across all runs
    pub total_requests: u64,

    /// Request log entries per status; statuses with no entries are omitted
    pub requests_by_status: BTreeMap<RequestStatus, u64>,
}

impl RunStatistics {
    /// Share of logged requests that ended in `status`, as a percentage
    pub fn percentage(&self, status: RequestStatus) -> f64 {
        let count = self.requests_by_status.get(&status).copied().unwrap_or(0);
        if self.total_requests > 0 {
            (count as f64 / self.total_requests as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<RunStatistics> {
    let content_rows = storage.count_content_rows()?;
    let catalog_records = storage.count_records()?;

    let mut requests_by_status = BTreeMap::new();
    for status in RequestStatus::ALL {
        let count = storage.count_requests_by_status(status)?;
        if count > 0 {
            requests_by_status.insert(status, count);
        }
    }

    Ok(RunStatistics {
        content_rows,
        catalog_records,
        total_requests: requests_by_status.values().sum(),
        requests_by_status,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Content rows: {}", stats.content_rows);
    println!("  Catalog records: {}", stats.catalog_records);
    println!("  Logged requests: {}", stats.total_requests);
    println!();

    if !stats.requests_by_status.is_empty() {
        println!("Requests by Status:");
        let mut status_counts: Vec<_> = stats.requests_by_status.iter().collect();
        status_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (status, count) in status_counts {
            println!("  {}: {} ({:.1}%)", status, count, stats.percentage(*status));
        }
        println!();
    }

    let succeeded = stats
        .requests_by_status
        .get(&RequestStatus::Success)
        .unwrap_or(&0);
    println!(
        "Success Rate: {:.1}% ({} / {} requests)",
        stats.percentage(RequestStatus::Success),
        succeeded,
        stats.total_requests
    );
}
