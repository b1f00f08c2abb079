//! Zendesk API access
//!
//! The client returns raw responses and never fails on a non-2xx status;
//! callers decide what a status means through [`classify_status`].

use crate::Cursor;
use async_trait::async_trait;
use std::time::Duration;

pub mod page;
pub mod zendesk;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Connection, timeout or body transfer failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    ClientError(String),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Raw API response: status, the headers the exporter cares about, and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw `retry-after` header value, if any
    pub retry_after: Option<String>,
    /// Response body
    pub body: String,
}

impl ApiResponse {
    /// Build a response without a `retry-after` header
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    /// Attach a `retry-after` header value
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }
}

/// What a response status means for the export loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusClass {
    /// 2xx: body holds a page
    Success,
    /// 429: wait and ask again with the same cursor.
    ///
    /// `retry_after` is `None` when the header was missing or unparseable.
    RateLimited {
        /// Server-directed wait
        retry_after: Option<Duration>,
    },
    /// 422: the cursor is too close to now for the export API
    CursorTooRecent,
    /// Anything else
    Unclassified(u16),
}

/// Classify a response status into an export action
pub fn classify_status(response: &ApiResponse) -> StatusClass {
    match response.status {
        429 => StatusClass::RateLimited {
            retry_after: response.retry_after.as_deref().and_then(parse_retry_after),
        },
        200..=299 => StatusClass::Success,
        422 => StatusClass::CursorTooRecent,
        other => StatusClass::Unclassified(other),
    }
}

/// Parse a `retry-after` header given in (possibly fractional) seconds
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs))
}

/// Source of export pages
///
/// Implemented by [`zendesk::ZendeskClient`]; tests substitute scripted sources.
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Fetch the export page starting at `cursor`
    async fn fetch_page(&self, cursor: Cursor) -> FetcherResult<ApiResponse>;
}
