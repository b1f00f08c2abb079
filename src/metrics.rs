//! Export observability metrics
//!
//! Records through the `metrics` facade; nothing is exported unless
//! [`init_metrics`] installs the Prometheus recorder. Without a recorder the
//! macros are no-ops.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::exporter::ExportSummary;
use crate::Cursor;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotent; must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics endpoint on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            METRICS_INITIALIZED.store(false, Ordering::SeqCst);
            format!("Failed to install Prometheus exporter: {e}")
        })?;

    describe_counter!(
        "zendesk_requests_total",
        Unit::Count,
        "Total HTTP requests sent to the Zendesk API"
    );
    describe_counter!(
        "zendesk_rate_limited_total",
        Unit::Count,
        "Total 429 responses waited out"
    );
    describe_histogram!(
        "zendesk_request_duration_seconds",
        Unit::Seconds,
        "Zendesk request duration"
    );
    describe_counter!("export_pages_total", Unit::Count, "Pages written to the sink");
    describe_counter!("export_rows_total", Unit::Count, "Ticket rows written to the sink");

    Ok(())
}

/// Timing and status of one HTTP request
pub struct HttpRequestMetrics {
    endpoint: &'static str,
    start_time: Instant,
}

impl HttpRequestMetrics {
    /// Start timing a request to `endpoint` (a path template, not a full URL)
    pub fn start(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start_time: Instant::now(),
        }
    }

    /// Record a completed request
    pub fn record_complete(&self, status_code: u16) {
        counter!(
            "zendesk_requests_total",
            "endpoint" => self.endpoint,
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!("zendesk_request_duration_seconds", "endpoint" => self.endpoint)
            .record(self.start_time.elapsed().as_secs_f64());
    }

    /// Record a request that never produced a response
    pub fn record_network_error(&self) {
        counter!(
            "zendesk_requests_total",
            "endpoint" => self.endpoint,
            "status" => "network_error",
        )
        .increment(1);

        warn!(
            endpoint = self.endpoint,
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            "Zendesk request failed before a response arrived"
        );
    }
}

/// Record a rate-limit wait
pub fn record_rate_limit_wait(delay: Duration) {
    counter!("zendesk_rate_limited_total").increment(1);
    histogram!("zendesk_rate_limit_wait_seconds").record(delay.as_secs_f64());
}

/// Record one page written to the sink
pub fn record_page_exported(rows: usize) {
    counter!("export_pages_total").increment(1);
    counter!("export_rows_total").increment(rows as u64);
}

/// Run-level export metrics
pub struct ExportMetrics {
    start_cursor: Cursor,
    start_time: Instant,
}

impl ExportMetrics {
    /// Start tracking an export run
    pub fn start(start_cursor: Cursor) -> Self {
        Self {
            start_cursor,
            start_time: Instant::now(),
        }
    }

    /// Record a run that ended normally
    pub fn record_success(&self, summary: &ExportSummary) {
        counter!("exports_completed_total", "stop" => summary.stop.as_str()).increment(1);

        info!(
            start_cursor = %self.start_cursor,
            last_cursor = %summary.last_cursor,
            pages = summary.pages,
            rows = summary.rows,
            stop = summary.stop.as_str(),
            duration_secs = self.start_time.elapsed().as_secs(),
            "Export finished"
        );
    }

    /// Record a run that ended with an error
    pub fn record_failure(&self, error: &str) {
        counter!("exports_failed_total").increment(1);

        error!(
            start_cursor = %self.start_cursor,
            error = %error,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Export failed"
        );
    }
}
