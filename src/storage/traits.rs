//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::extract::CatalogRecord;
use crate::storage::{ContentRow, RequestLogEntry, RequestStatus};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage is closed")]
    Closed,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes are invoked synchronously from a single task; implementations
/// serialize their own writes.
pub trait Storage {
    // ===== Writes =====

    /// Appends one extracted page
    ///
    /// Rows are never merged: saving the same URL twice yields two rows.
    ///
    /// # Returns
    ///
    /// The row ID of the inserted content
    fn save_content(
        &mut self,
        url: &str,
        domain: &str,
        title: &str,
        content: &str,
        links: &BTreeSet<String>,
    ) -> StorageResult<i64>;

    /// Appends ranked records in order, all or nothing
    ///
    /// # Returns
    ///
    /// The number of records written
    fn save_records(&mut self, records: &[CatalogRecord], source_url: &str) -> StorageResult<usize>;

    /// Appends one request log entry
    fn record_request(&mut self, url: &str, status: RequestStatus, bytes: u64) -> StorageResult<()>;

    /// Best-effort request logging; failures are logged and swallowed
    fn log_request(&mut self, url: &str, status: RequestStatus, bytes: u64) {
        if let Err(e) = self.record_request(url, status, bytes) {
            tracing::error!(url, %status, bytes, "Failed to write request log entry: {}", e);
        }
    }

    /// Releases the backend; closing twice is a no-op
    fn close(&mut self) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts rows in the content table
    fn count_content_rows(&self) -> StorageResult<u64>;

    /// Counts rows in the records table
    fn count_records(&self) -> StorageResult<u64>;

    /// Counts log entries with the given status
    fn count_requests_by_status(&self, status: RequestStatus) -> StorageResult<u64>;

    /// All request log entries in insertion order
    fn request_log(&self) -> StorageResult<Vec<RequestLogEntry>>;

    /// Content rows saved for `url`, oldest first
    fn content_for_url(&self, url: &str) -> StorageResult<Vec<ContentRow>>;
}
