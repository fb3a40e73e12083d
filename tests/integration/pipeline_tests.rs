//! Integration tests for the harvest pipeline
//!
//! These tests drive a full coordinator run against a scripted browser
//! session and an on-disk SQLite database, then reopen the database to
//! inspect what was persisted.

use async_trait::async_trait;
use gleaner::config::DelayRange;
use gleaner::crawler::{
    BrowserSession, Coordinator, FetchSettings, Fetcher, RunPhase, RunSummary, ScrollPosition,
    SessionError, SessionLauncher, SessionOptions,
};
use gleaner::extract::{CatalogRecord, Extractor, Strategy, StrategyTable};
use gleaner::robots::RobotsGate;
use gleaner::rotation::EndpointRotator;
use gleaner::storage::{
    ContentRow, RequestLogEntry, RequestStatus, SqliteStorage, Storage, StorageError,
    StorageResult,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scraper::ElementRef;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves fixed markup per URL; unknown URLs yield an empty page
struct FixtureLauncher {
    pages: Arc<HashMap<String, String>>,
    /// Cancelled on the first navigation, if set
    cancel_on_navigate: Option<CancellationToken>,
}

struct FixtureSession {
    pages: Arc<HashMap<String, String>>,
    cancel_on_navigate: Option<CancellationToken>,
    current: String,
}

#[async_trait]
impl SessionLauncher for FixtureLauncher {
    async fn launch(&self, _: &SessionOptions) -> Result<Box<dyn BrowserSession>, SessionError> {
        Ok(Box::new(FixtureSession {
            pages: self.pages.clone(),
            cancel_on_navigate: self.cancel_on_navigate.clone(),
            current: String::new(),
        }))
    }
}

#[async_trait]
impl BrowserSession for FixtureSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        if let Some(token) = &self.cancel_on_navigate {
            token.cancel();
        }
        self.current = self.pages.get(url).cloned().unwrap_or_default();
        Ok(())
    }

    async fn has_element(&mut self, _: &str) -> Result<bool, SessionError> {
        Ok(true)
    }

    async fn ready_state(&mut self) -> Result<String, SessionError> {
        Ok("complete".to_string())
    }

    async fn scroll(&mut self, _: ScrollPosition) -> Result<(), SessionError> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        Ok(self.current.clone())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Delegates to SQLite but refuses every content write
struct RejectingStorage(SqliteStorage);

impl Storage for RejectingStorage {
    fn save_content(
        &mut self,
        _url: &str,
        _domain: &str,
        _title: &str,
        _content: &str,
        _links: &BTreeSet<String>,
    ) -> StorageResult<i64> {
        Err(StorageError::Database("disk full".to_string()))
    }

    fn save_records(&mut self, records: &[CatalogRecord], source_url: &str) -> StorageResult<usize> {
        self.0.save_records(records, source_url)
    }

    fn record_request(&mut self, url: &str, status: RequestStatus, bytes: u64) -> StorageResult<()> {
        self.0.record_request(url, status, bytes)
    }

    fn close(&mut self) -> StorageResult<()> {
        self.0.close()
    }

    fn count_content_rows(&self) -> StorageResult<u64> {
        self.0.count_content_rows()
    }

    fn count_records(&self) -> StorageResult<u64> {
        self.0.count_records()
    }

    fn count_requests_by_status(&self, status: RequestStatus) -> StorageResult<u64> {
        self.0.count_requests_by_status(status)
    }

    fn request_log(&self) -> StorageResult<Vec<RequestLogEntry>> {
        self.0.request_log()
    }

    fn content_for_url(&self, url: &str) -> StorageResult<Vec<ContentRow>> {
        self.0.content_for_url(url)
    }
}

/// A test harness around one database file
struct Harness {
    dir: TempDir,
    pages: HashMap<String, String>,
    cancel: CancellationToken,
    cancel_on_navigate: bool,
    robots: Option<RobotsGate>,
    extractor: Option<Extractor>,
    pacing: DelayRange,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            pages: HashMap::new(),
            cancel: CancellationToken::new(),
            cancel_on_navigate: false,
            robots: None,
            extractor: None,
            pacing: DelayRange::new(1.0, 3.0),
        }
    }

    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("harvest.db")
    }

    fn open(&self) -> SqliteStorage {
        SqliteStorage::new(&self.db_path()).expect("Failed to open database")
    }

    fn coordinator(&mut self, storage: Box<dyn Storage + Send>) -> Coordinator {
        let launcher = FixtureLauncher {
            pages: Arc::new(self.pages.clone()),
            cancel_on_navigate: self.cancel_on_navigate.then(|| self.cancel.clone()),
        };
        let fetcher = Fetcher::new(
            Box::new(launcher),
            EndpointRotator::direct(StdRng::seed_from_u64(11)),
            settings(),
            StdRng::seed_from_u64(12),
            self.cancel.clone(),
        );
        Coordinator::new(
            fetcher,
            self.extractor.take().unwrap_or_default(),
            storage,
            self.robots.take(),
            self.pacing,
            StdRng::seed_from_u64(13),
            self.cancel.clone(),
        )
    }

    async fn run(&mut self, targets: &[&str]) -> RunSummary {
        let storage = Box::new(self.open());
        let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        let mut coordinator = self.coordinator(storage);
        let summary = coordinator.run(&targets).await;
        assert_eq!(coordinator.phase(), RunPhase::Done);
        summary
    }
}

fn settings() -> FetchSettings {
    FetchSettings {
        max_retries: 3,
        wait_timeout: Duration::from_secs(1),
        headless: true,
        min_content_bytes: 100,
        base_delay: 0.5,
        pre_navigation: DelayRange::zero(),
        jitter: DelayRange::zero(),
        scroll_pause: Duration::ZERO,
        settle_pause: Duration::ZERO,
        poll_interval: Duration::from_millis(10),
        window: (1366, 768),
    }
}

fn article(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>
        <nav><a href="/home">Home</a></nav>
        <main>{}</main>
        <a href="https://other.test/page?utm_source=x">out</a>
        <a href="mailto:someone@example.com">mail</a>
        <!-- {} -->
        </body></html>"#,
        title,
        body,
        "padding ".repeat(20)
    )
}

fn statuses(log: &[RequestLogEntry]) -> HashMap<String, RequestStatus> {
    log.iter().map(|e| (e.url.clone(), e.status)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_every_target_logged_once() {
    let mut harness = Harness::new()
        .page("https://a.test/one", article("One", "First article"))
        .page("https://b.test/two", article("Two", "Second article"))
        .page("https://c.test/tiny", "<html></html>".to_string());

    let summary = harness
        .run(&["https://a.test/one", "https://b.test/two", "https://c.test/tiny"])
        .await;
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.count(RequestStatus::Success), 2);
    assert_eq!(summary.count(RequestStatus::Failed), 1);

    let storage = harness.open();
    let log = storage.request_log().unwrap();
    assert_eq!(log.len(), 3);

    let by_url = statuses(&log);
    assert_eq!(by_url["https://a.test/one"], RequestStatus::Success);
    assert_eq!(by_url["https://c.test/tiny"], RequestStatus::Failed);

    let tiny = log.iter().find(|e| e.url == "https://c.test/tiny").unwrap();
    assert_eq!(tiny.bytes, 0);
    assert!(storage.content_for_url("https://c.test/tiny").unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_content_row_holds_extracted_fields() {
    let mut harness = Harness::new().page("https://a.test/one", article("One", "First article"));
    harness.run(&["https://a.test/one"]).await;

    let storage = harness.open();
    let rows = storage.content_for_url("https://a.test/one").unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.domain, "a.test");
    assert_eq!(row.title, "One");
    assert_eq!(row.content, "First article");
    assert_eq!(
        row.links,
        vec!["https://a.test/home".to_string(), "https://other.test/page?utm_source=x".to_string()]
    );

    let log = storage.request_log().unwrap();
    assert_eq!(log[0].bytes, article("One", "First article").len() as u64);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_appends_to_existing_database() {
    let mut harness = Harness::new().page("https://a.test/one", article("One", "First article"));
    harness.run(&["https://a.test/one"]).await;
    harness.run(&["https://a.test/one"]).await;

    let storage = harness.open();
    assert_eq!(storage.content_for_url("https://a.test/one").unwrap().len(), 2);
    assert_eq!(storage.count_requests_by_status(RequestStatus::Success).unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_catalog_page_persists_records() {
    let chart = r#"<html><head><title>Top 250</title></head><body>
        <ul class="ipc-metadata-list">
        <li class="ipc-metadata-list-summary-item">
            <h3 class="ipc-title__text">1. The Shawshank Redemption</h3>
            <span class="cli-title-metadata-item">1994</span>
            <span class="cli-title-metadata-item">2h 22m</span>
            <span class="ipc-rating-star">9.3</span>
        </li>
        <li class="ipc-metadata-list-summary-item">
            <h3 class="ipc-title__text">2. The Godfather</h3>
            <span class="cli-title-metadata-item">1972</span>
            <span class="cli-title-metadata-item">2h 55m</span>
            <span class="ipc-rating-star">9.2</span>
        </li>
        </ul></body></html>"#;
    let url = "https://www.imdb.com/chart/top/";
    let mut harness = Harness::new().page(url, chart.to_string());

    let summary = harness.run(&[url]).await;
    assert_eq!(summary.count(RequestStatus::Success), 1);

    let storage = harness.open();
    assert_eq!(storage.count_records().unwrap(), 2);

    let rows = storage.content_for_url(url).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].content,
        "The Shawshank Redemption (1994) - Rating: 9.3\nThe Godfather (1972) - Rating: 9.2"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_url_is_parse_failed() {
    let target = "relative/page";
    let mut harness = Harness::new().page(target, article("Lost", "No base URL"));

    let summary = harness.run(&[target]).await;
    assert_eq!(summary.count(RequestStatus::ParseFailed), 1);

    let storage = harness.open();
    let log = storage.request_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, RequestStatus::ParseFailed);
    assert!(log[0].bytes > 0);
    assert_eq!(storage.count_content_rows().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_is_save_failed() {
    let mut harness = Harness::new().page("https://a.test/one", article("One", "First article"));
    let storage = Box::new(RejectingStorage(harness.open()));
    let mut coordinator = harness.coordinator(storage);

    let summary = coordinator.run(&["https://a.test/one".to_string()]).await;
    assert_eq!(summary.count(RequestStatus::SaveFailed), 1);

    let storage = harness.open();
    let log = storage.request_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, RequestStatus::SaveFailed);
    assert!(log[0].bytes > 0);
    assert_eq!(storage.count_content_rows().unwrap(), 0);
}

fn exploding(_: ElementRef<'_>) -> Result<Option<String>, gleaner::extract::ExtractError> {
    panic!("strategy bug");
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_failure_is_logged_as_error() {
    let mut table = StrategyTable::standard();
    table.register(Strategy {
        name: "exploding",
        host_pattern: "boom.test",
        extract: exploding,
    });

    let mut harness = Harness::new()
        .page("https://boom.test/", article("Boom", "never extracted"))
        .page("https://a.test/one", article("One", "First article"));
    harness.extractor = Some(Extractor::with_strategies(table));

    let summary = harness.run(&["https://boom.test/", "https://a.test/one"]).await;
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.count(RequestStatus::Error), 1);
    assert_eq!(summary.count(RequestStatus::Success), 1);

    let storage = harness.open();
    let log = storage.request_log().unwrap();
    let boom = log.iter().find(|e| e.url == "https://boom.test/").unwrap();
    assert_eq!(boom.status, RequestStatus::Error);
    assert_eq!(boom.bytes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_finishes_current_target_only() {
    let mut harness = Harness::new()
        .page("https://a.test/one", article("One", "First article"))
        .page("https://b.test/two", article("Two", "Second article"))
        .page("https://c.test/three", article("Three", "Third article"));
    harness.cancel_on_navigate = true;

    let summary = harness
        .run(&["https://a.test/one", "https://b.test/two", "https://c.test/three"])
        .await;
    assert!(summary.interrupted);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.count(RequestStatus::Success), 1);

    let storage = harness.open();
    assert_eq!(storage.request_log().unwrap().len(), 1);
    assert_eq!(storage.count_content_rows().unwrap(), 1);
}

#[tokio::test]
async fn test_robots_disallowed_target_is_not_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let open = format!("{}/public", server.uri());
    let blocked = format!("{}/private/page", server.uri());

    let mut harness = Harness::new()
        .page(&open, article("Public", "Open page"))
        .page(&blocked, article("Private", "Hidden page"));
    harness.robots = Some(RobotsGate::new("gleaner", Duration::from_secs(5)).unwrap());

    // The mock server runs on the real clock
    harness.pacing = DelayRange::zero();

    let summary = harness.run(&[open.as_str(), blocked.as_str()]).await;
    assert_eq!(summary.count(RequestStatus::Success), 1);
    assert_eq!(summary.count(RequestStatus::Failed), 1);

    let storage = harness.open();
    let by_url = statuses(&storage.request_log().unwrap());
    assert_eq!(by_url[&open], RequestStatus::Success);
    assert_eq!(by_url[&blocked], RequestStatus::Failed);
    assert!(storage.content_for_url(&blocked).unwrap().is_empty());
}
