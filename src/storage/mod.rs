//! Storage module for persisting harvested data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Extracted page content with serialized outbound links
//! - Ranked catalog records
//! - The per-target request log

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::GleanerError;
use std::fmt;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(GleanerError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, GleanerError> {
    SqliteStorage::new(path)
}

/// Outcome recorded in the request log for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestStatus {
    /// Fetched, extracted and persisted
    Success,
    /// No valid content after every attempt, or the target was not fetched
    Failed,
    /// Content was fetched but could not be extracted
    ParseFailed,
    /// Extraction succeeded but persistence did not
    SaveFailed,
    /// An unexpected error interrupted the pipeline
    Error,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        Self::Success,
        Self::Failed,
        Self::ParseFailed,
        Self::SaveFailed,
        Self::Error,
    ];

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::ParseFailed => "parse_failed",
            Self::SaveFailed => "save_failed",
            Self::Error => "error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "parse_failed" => Some(Self::ParseFailed),
            "save_failed" => Some(Self::SaveFailed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// One row of the request log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLogEntry {
    pub id: i64,
    pub url: String,
    pub status: RequestStatus,
    pub bytes: u64,
    pub logged_at: String,
}

/// One row of the content table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRow {
    pub id: i64,
    pub url: String,
    pub domain: String,
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
    pub scraped_at: String,
}
