//! Gleaner: a resilient, browser-driven page harvester
//!
//! This crate fetches a fixed list of target pages through a headless browser,
//! extracts structured content with site-aware strategies, and persists the
//! results alongside an audit log of every attempt.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod rotation;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FetchOutcome, Fetcher, RunPhase, RunSummary};
pub use extract::{CatalogRecord, Extractor, ParsedDocument};
pub use storage::{RequestStatus, SqliteStorage, Storage};
