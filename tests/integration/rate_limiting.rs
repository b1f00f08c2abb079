//! Integration tests for rate-limit handling and interruption in the export loop

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use zendesk_export::exporter::{ExportDriver, ExportOptions, StopReason};
use zendesk_export::fetcher::{ApiResponse, ExportSource, FetcherResult};
use zendesk_export::resume::CursorLog;
use zendesk_export::shutdown::{SharedShutdown, ShutdownFlag};
use zendesk_export::Cursor;

/// Replays canned responses and records requested cursors
struct ScriptedSource {
    responses: Mutex<VecDeque<ApiResponse>>,
    requested: Mutex<Vec<Cursor>>,
    shutdown_after_first: Option<SharedShutdown>,
}

impl ScriptedSource {
    fn new(responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requested: Mutex::new(Vec::new()),
            shutdown_after_first: None,
        }
    }

    fn requested(&self) -> Vec<Cursor> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportSource for ScriptedSource {
    async fn fetch_page(&self, cursor: Cursor) -> FetcherResult<ApiResponse> {
        self.requested.lock().unwrap().push(cursor);
        if let Some(flag) = &self.shutdown_after_first {
            flag.request_shutdown();
        }
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted");
        Ok(response)
    }
}

fn page(id: u64, end_time: &str) -> ApiResponse {
    ApiResponse::new(
        200,
        format!(r#"{{"field_headers":["id"],"results":[{{"id":{id}}}],"end_time":{end_time}}}"#),
    )
}

fn setup(cursor: i64) -> (TempDir, ExportOptions) {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log.txt");
    CursorLog::seed(&log, Cursor::new(cursor)).unwrap();
    let options = ExportOptions::new(dir.path().join("zendump.csv"), log);
    (dir, options)
}

#[tokio::test(start_paused = true)]
async fn test_waits_retry_after_then_repeats_same_cursor() {
    let (dir, options) = setup(1700000000);
    let source = ScriptedSource::new(vec![
        ApiResponse::new(429, "").with_retry_after("5"),
        page(1, r#""""#),
    ]);

    let driver = ExportDriver::new(source, options);
    let started = tokio::time::Instant::now();
    let summary = driver.run().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(
        driver.source().requested(),
        vec![Cursor::new(1700000000), Cursor::new(1700000000)]
    );
    assert_eq!(summary.rows, 1);

    let output = std::fs::read_to_string(dir.path().join("zendump.csv")).unwrap();
    assert_eq!(output, "\"id\"\n\"1\"\n");
}

#[tokio::test(start_paused = true)]
async fn test_missing_retry_after_uses_exponential_backoff() {
    let (_dir, options) = setup(1700000000);
    let source = ScriptedSource::new(vec![
        ApiResponse::new(429, ""),
        ApiResponse::new(429, "").with_retry_after("not-a-number"),
        page(1, "null"),
    ]);

    let driver = ExportDriver::new(source, options);
    let started = tokio::time::Instant::now();
    driver.run().await.unwrap();

    // 1s then 2s
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(driver.source().requested().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_on_later_page_keeps_earlier_progress() {
    let (dir, options) = setup(100);
    let source = ScriptedSource::new(vec![
        page(1, "200"),
        ApiResponse::new(429, "").with_retry_after("30"),
        page(2, r#""""#),
    ]);

    let driver = ExportDriver::new(source, options);
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(
        driver.source().requested(),
        vec![Cursor::new(100), Cursor::new(200), Cursor::new(200)]
    );
    let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
    assert_eq!(log, "100\n200\n");
}

#[tokio::test]
async fn test_shutdown_stops_between_pages() {
    let (dir, options) = setup(100);
    let shutdown = ShutdownFlag::shared();
    let mut source = ScriptedSource::new(vec![page(1, "200"), page(2, "300")]);
    source.shutdown_after_first = Some(shutdown.clone());

    let driver = ExportDriver::new(source, options).with_shutdown(shutdown);
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.stop, StopReason::Interrupted);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.last_cursor, Cursor::new(200));
    assert_eq!(driver.source().requested(), vec![Cursor::new(100)]);

    let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
    assert_eq!(log, "100\n200\n");
}
