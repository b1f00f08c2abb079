//! CLI error types and conversions

use crate::config::ConfigError;
use crate::exporter::{ExportError, RateLimitError};
use crate::fetcher::FetcherError;
use crate::resume::ResumeError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Export error
    #[error("export error: {0}")]
    ExportError(#[from] ExportError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Rate limit error
    #[error("rate limit error: {0}")]
    RateLimitError(#[from] RateLimitError),

    /// Resume error
    #[error("resume error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Non-success response to an ad-hoc request
    #[error("request failed with HTTP {status}: {body}")]
    RequestFailed {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Metrics endpoint could not be started
    #[error("metrics error: {0}")]
    MetricsError(String),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
