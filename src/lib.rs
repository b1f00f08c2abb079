//! # Zendesk Export Library
//!
//! Incrementally exports tickets from the Zendesk incremental export API into a
//! local delimited file, resuming from a cursor persisted across runs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zendesk_export::config::ZendeskConfig;
//! use zendesk_export::exporter::{ExportDriver, ExportOptions};
//! use zendesk_export::fetcher::zendesk::ZendeskClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ZendeskConfig::from_email(
//!     "https://acme.zendesk.com/api/v2",
//!     "agent@acme.com",
//!     "api-token",
//! )?;
//! let client = ZendeskClient::new(config)?;
//!
//! // log.txt must already hold a starting cursor (see `zendesk-export seed`)
//! let driver = ExportDriver::new(client, ExportOptions::new("zendump.csv", "log.txt"));
//! let summary = driver.run().await?;
//! println!("{} pages, {} tickets", summary.pages, summary.rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Zendesk HTTP client, response classification and page parsing
//! - [`exporter`] - The incremental pull loop and rate-limit backoff
//! - [`output`] - Delimited ticket writer
//! - [`resume`] - Append-only cursor log and run lock
//! - [`config`] - Connection configuration
//! - [`cli`] - Command line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Connection configuration
pub mod config;

/// Export orchestration
pub mod exporter;

/// Zendesk API access
pub mod fetcher;

/// Export metrics
pub mod metrics;

/// Ticket output writers
pub mod output;

/// Cursor persistence
pub mod resume;

/// Ctrl+C handling
pub mod shutdown;

/// A ticket as returned by the export API: field name to JSON value
pub type TicketRecord = serde_json::Map<String, serde_json::Value>;

/// Position in the incremental export stream
///
/// Zendesk issues these as Unix epoch seconds (`start_time` on requests,
/// `end_time` on responses). The value is otherwise treated as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(i64);

impl Cursor {
    /// Wrap a raw cursor value
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw cursor value
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Cursor {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<i64>()
            .map(Cursor)
            .map_err(|_| format!("Invalid cursor: {trimmed:?}"))
    }
}

/// One page of the incremental ticket export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportPage {
    /// Tickets in this page, in server order
    pub tickets: Vec<TicketRecord>,
    /// Column schema for the export, stable across pages of one run
    pub field_headers: Vec<String>,
    /// Cursor for the next page; `None` when the server sent the end-of-stream sentinel
    pub next_cursor: Option<Cursor>,
    /// Explicit end-of-stream flag sent by newer API versions
    pub end_of_stream: bool,
}

impl ExportPage {
    /// Column order to use for this page.
    ///
    /// Falls back to the first ticket's key order when the page carries no
    /// headers.
    pub fn columns(&self) -> Option<Vec<String>> {
        if !self.field_headers.is_empty() {
            return Some(self.field_headers.clone());
        }
        self.tickets
            .first()
            .map(|ticket| ticket.keys().cloned().collect())
    }
}
