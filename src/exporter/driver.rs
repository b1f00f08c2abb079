//! Export driver: the incremental pull loop

use tracing::{debug, info, warn};

use super::rate_limit::{RateLimitBackoff, RateLimitError};
use super::{ExportError, ExportOptions, ExportSummary, StopReason};
use crate::fetcher::page::parse_export_page;
use crate::fetcher::{classify_status, ApiResponse, ExportSource, StatusClass};
use crate::metrics::{record_page_exported, ExportMetrics};
use crate::output::csv::CsvTicketWriter;
use crate::output::{OutputWriter, TicketWriter};
use crate::resume::{CursorLog, ExportLock};
use crate::shutdown::SharedShutdown;
use crate::Cursor;

/// Outcome of fetching one cursor
enum Fetched {
    Page(ApiResponse),
    TooRecent,
}

/// Drives an export from the logged cursor to the end of the stream
pub struct ExportDriver<S> {
    source: S,
    options: ExportOptions,
    backoff: RateLimitBackoff,
    shutdown: Option<SharedShutdown>,
}

impl<S: ExportSource> ExportDriver<S> {
    /// Create a driver over `source`
    pub fn new(source: S, options: ExportOptions) -> Self {
        let backoff = RateLimitBackoff::new(options.max_rate_limit_retries);
        Self {
            source,
            options,
            backoff,
            shutdown: None,
        }
    }

    /// Stop between pages once `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Page source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run options
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Run the export to completion.
    ///
    /// The output file, cursor log and run lock are owned by this call and
    /// released on every exit path.
    ///
    /// # Errors
    /// Missing or invalid resume cursor, another run holding the lock, IO
    /// failures, network failures, unexpected statuses and exhausted
    /// rate-limit retries.
    pub async fn run(&self) -> Result<ExportSummary, ExportError> {
        let mut lock = ExportLock::open(&self.options.log_path)?;
        let _guard = lock.try_guard()?;

        let mut log = CursorLog::open(&self.options.log_path)?;
        let start = log.last_cursor();
        let metrics = ExportMetrics::start(start);

        let mut writer = CsvTicketWriter::open(
            &self.options.output_path,
            self.options.delimiter,
            self.options.overwrite,
        )?;

        info!(
            cursor = %start,
            output = %self.options.output_path.display(),
            "Starting Zendesk ticket export"
        );

        match self.pull(start, &mut writer, &mut log).await {
            Ok(summary) => {
                writer.close()?;
                log.close()?;
                metrics.record_success(&summary);
                Ok(summary)
            }
            Err(e) => {
                metrics.record_failure(&e.to_string());
                Err(e)
            }
        }
    }

    async fn pull(
        &self,
        start: Cursor,
        writer: &mut CsvTicketWriter,
        log: &mut CursorLog,
    ) -> Result<ExportSummary, ExportError> {
        let mut cursor = start;
        let mut pages = 0u64;
        let mut rows = 0u64;

        let stop = loop {
            let response = match self.fetch(cursor).await? {
                Fetched::Page(response) => response,
                Fetched::TooRecent => {
                    warn!(
                        cursor = %cursor,
                        "Start time is too recent. Try a start_time older than 5 minutes."
                    );
                    break StopReason::CursorTooRecent;
                }
            };

            let page = match parse_export_page(&response.body) {
                Ok(page) => page,
                Err(e) => {
                    info!(cursor = %cursor, error = %e, "Reached most current ticket.");
                    break StopReason::UnreadableBody;
                }
            };

            let written = writer.write_page(&page)?;
            pages += 1;
            rows += written as u64;
            record_page_exported(written);

            let Some(next) = page.next_cursor else {
                info!(page = pages, rows = written, "Page exported. Reached most current ticket.");
                break StopReason::EndOfStream;
            };

            if next == cursor {
                warn!(
                    page = pages,
                    rows = written,
                    cursor = %cursor,
                    "Continuation cursor did not advance; stopping without logging it"
                );
                break StopReason::Stalled;
            }

            // Only after the rows are flushed
            log.append(next)?;
            info!(page = pages, rows = written, next_cursor = %next, "Page exported");

            if page.end_of_stream {
                info!(cursor = %next, "Server reported end of stream");
                break StopReason::EndOfStream;
            }

            cursor = next;

            if self.shutdown_requested() {
                warn!(cursor = %cursor, "Export interrupted; resume cursor saved");
                break StopReason::Interrupted;
            }
        };

        Ok(ExportSummary {
            pages,
            rows,
            start_cursor: start,
            last_cursor: log.last_cursor(),
            stop,
        })
    }

    async fn fetch(&self, cursor: Cursor) -> Result<Fetched, ExportError> {
        debug!(cursor = %cursor, "Fetching export page");

        let response = self
            .backoff
            .send(|| self.source.fetch_page(cursor))
            .await
            .map_err(|e| match e {
                RateLimitError::Exhausted { attempts } => {
                    ExportError::RateLimitRetriesExhausted { attempts, cursor }
                }
                RateLimitError::Fetcher(e) => ExportError::FetcherError(e),
            })?;

        match classify_status(&response) {
            StatusClass::Success => Ok(Fetched::Page(response)),
            StatusClass::CursorTooRecent => Ok(Fetched::TooRecent),
            StatusClass::RateLimited { .. } | StatusClass::Unclassified(_) => Err(
                ExportError::unexpected_status(response.status, cursor, &response.body),
            ),
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.is_shutdown_requested())
    }
}
