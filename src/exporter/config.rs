//! Export configuration constants and options

use std::path::PathBuf;
use std::time::Duration;

/// Maximum consecutive 429 responses waited out for one cursor.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 5;

/// Initial backoff when a 429 carries no usable `retry-after` header.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Cap on the fallback backoff. Zendesk's rate-limit window is one minute.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Default field delimiter. Ticket bodies are free text, so commas are a poor fit.
pub const DEFAULT_DELIMITER: u8 = b'~';

/// Default output file
pub const DEFAULT_OUTPUT_PATH: &str = "zendump.csv";

/// Default cursor log
pub const DEFAULT_LOG_PATH: &str = "log.txt";

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// Settings for one export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Delimited output file
    pub output_path: PathBuf,
    /// Append-only cursor log
    pub log_path: PathBuf,
    /// Field delimiter byte
    pub delimiter: u8,
    /// Truncate the output instead of appending
    pub overwrite: bool,
    /// Consecutive 429 responses tolerated per cursor
    pub max_rate_limit_retries: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_PATH, DEFAULT_LOG_PATH)
    }
}

impl ExportOptions {
    /// Options with default delimiter, append mode and retry budget
    pub fn new(output_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            log_path: log_path.into(),
            delimiter: DEFAULT_DELIMITER,
            overwrite: false,
            max_rate_limit_retries: MAX_RATE_LIMIT_RETRIES,
        }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Truncate the output file on open
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the rate-limit retry budget
    pub fn with_max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }
}
