//! Incremental export orchestration
//!
//! The driver turns a resume cursor into a complete, durably resumable export:
//!
//! 1. Read the resume cursor from the log's last line
//! 2. Fetch a page, waiting out 429 responses ([`rate_limit::RateLimitBackoff`])
//! 3. Write the page's tickets and flush the sink
//! 4. Append the page's continuation cursor to the log
//! 5. Repeat until the server sends the end-of-stream sentinel
//!
//! A crash between steps 3 and 4 re-exports that page on the next run.
//! Duplicate rows can be removed downstream; skipped tickets cannot be
//! recovered, so the cursor is never logged ahead of its rows.
//!
//! # Components
//!
//! - [`driver`] - The pull loop
//! - [`rate_limit`] - Retry-after backoff
//! - [`config`] - Constants and [`ExportOptions`]

pub mod config;
pub mod driver;
pub mod rate_limit;

pub use config::ExportOptions;
pub use driver::ExportDriver;
pub use rate_limit::{RateLimitBackoff, RateLimitError};

use crate::fetcher::FetcherError;
use crate::output::OutputError;
use crate::resume::ResumeError;
use crate::Cursor;

/// Longest response body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Resume error
    #[error("resume error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Status other than 2xx, 422 or 429
    #[error("unexpected HTTP status {status} at cursor {cursor}: {body}")]
    UnexpectedStatus {
        /// HTTP status
        status: u16,
        /// Cursor that was requested
        cursor: Cursor,
        /// Response body, truncated
        body: String,
    },

    /// 429 persisted past the retry budget
    #[error("rate limit retry exhausted after {attempts} retries at cursor {cursor}")]
    RateLimitRetriesExhausted {
        /// Retries performed
        attempts: u32,
        /// Cursor that was requested
        cursor: Cursor,
    },
}

impl ExportError {
    pub(crate) fn unexpected_status(status: u16, cursor: Cursor, body: &str) -> Self {
        Self::UnexpectedStatus {
            status,
            cursor,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }
}

/// Why an export run stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Server sent the end-of-stream sentinel
    EndOfStream,
    /// Response body could not be decoded; treated as no more data
    UnreadableBody,
    /// Server answered 422: the cursor is too recent to export
    CursorTooRecent,
    /// Ctrl+C between pages
    Interrupted,
    /// Server returned the requested cursor as the continuation; the stream
    /// is not finished but cannot advance
    Stalled,
}

impl StopReason {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::EndOfStream => "end_of_stream",
            StopReason::UnreadableBody => "unreadable_body",
            StopReason::CursorTooRecent => "cursor_too_recent",
            StopReason::Interrupted => "interrupted",
            StopReason::Stalled => "stalled",
        }
    }
}

/// Result of a finished export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Pages written to the sink
    pub pages: u64,
    /// Ticket rows written
    pub rows: u64,
    /// Cursor the run started from
    pub start_cursor: Cursor,
    /// Resume cursor for the next run
    pub last_cursor: Cursor,
    /// Why the run stopped
    pub stop: StopReason,
}
