//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::extract::CatalogRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ContentRow, RequestLogEntry, RequestStatus};
use crate::GleanerError;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::Path;

/// SQLite storage backend
///
/// The connection is released by [`Storage::close`]; every later call fails
/// with [`StorageError::Closed`].
pub struct SqliteStorage {
    conn: Option<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(GleanerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, GleanerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn: Some(conn) })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, GleanerError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    /// Returns true until [`Storage::close`] has been called
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> StorageResult<&Connection> {
        self.conn.as_ref().ok_or(StorageError::Closed)
    }

    fn conn_mut(&mut self) -> StorageResult<&mut Connection> {
        self.conn.as_mut().ok_or(StorageError::Closed)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Writes =====

    fn save_content(
        &mut self,
        url: &str,
        domain: &str,
        title: &str,
        content: &str,
        links: &BTreeSet<String>,
    ) -> StorageResult<i64> {
        let links_json = serde_json::to_string(links)?;
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO scraped_content (url, domain, title, content, links, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![url, domain, title, content, links_json, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn save_records(&mut self, records: &[CatalogRecord], source_url: &str) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn_mut()?.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO catalog_records
                 (rank, title, year, genre, rating, duration, source_url, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for record in records {
                stmt.execute(params![
                    record.rank,
                    record.title,
                    record.year,
                    record.genre,
                    record.rating,
                    record.duration,
                    source_url,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn record_request(&mut self, url: &str, status: RequestStatus, bytes: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO request_log (url, status, bytes, logged_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, status.to_db_string(), bytes as i64, now],
        )?;
        Ok(())
    }

    fn close(&mut self) -> StorageResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
            tracing::debug!("Database connection closed");
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_content_rows(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM scraped_content")
    }

    fn count_records(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM catalog_records")
    }

    fn count_requests_by_status(&self, status: RequestStatus) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM request_log WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn request_log(&self) -> StorageResult<Vec<RequestLogEntry>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, url, status, bytes, logged_at FROM request_log ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, url, status, bytes, logged_at)| -> StorageResult<RequestLogEntry> {
                let status = RequestStatus::from_db_string(&status).ok_or_else(|| {
                    StorageError::Database(format!("Unknown request status '{}'", status))
                })?;
                Ok(RequestLogEntry {
                    id,
                    url,
                    status,
                    bytes: bytes as u64,
                    logged_at,
                })
            })
            .collect()
    }

    fn content_for_url(&self, url: &str) -> StorageResult<Vec<ContentRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, url, domain, title, content, links, scraped_at
             FROM scraped_content WHERE url = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![url], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, url, domain, title, content, links, scraped_at)| -> StorageResult<ContentRow> {
                Ok(ContentRow {
                    id,
                    url,
                    domain,
                    title,
                    content,
                    links: serde_json::from_str(&links)?,
                    scraped_at,
                })
            })
            .collect()
    }
}
