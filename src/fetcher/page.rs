//! Export page parsing
//!
//! Zendesk's incremental export responses look like:
//!
//! ```json
//! {
//!   "results": [{"id": 1, "subject": "..."}],
//!   "field_headers": {"id": "Id", "subject": "Subject"},
//!   "end_time": 1700000100,
//!   "next_page": "https://.../exports/tickets.json?start_time=1700000100"
//! }
//! ```
//!
//! `field_headers` is either an object (keys are column names, in document
//! order) or a plain array of names. `end_time` may be a number, a numeric
//! string, `""` or `null`; the last two mark the end of the stream.

use serde::Deserialize;
use serde_json::Value;

use crate::fetcher::{FetcherError, FetcherResult};
use crate::{Cursor, ExportPage, TicketRecord};

#[derive(Debug, Deserialize)]
struct RawExportPage {
    results: Vec<TicketRecord>,
    #[serde(default)]
    field_headers: Value,
    #[serde(default)]
    end_time: Value,
    #[serde(default)]
    end_of_stream: Option<bool>,
}

/// Decode an export response body into an [`ExportPage`]
///
/// # Errors
/// Returns `ParseError` for malformed or empty JSON, a missing `results`
/// array, or header/cursor fields of an unexpected shape.
pub fn parse_export_page(body: &str) -> FetcherResult<ExportPage> {
    let raw: RawExportPage = serde_json::from_str(body)
        .map_err(|e| FetcherError::ParseError(format!("Failed to decode export page: {e}")))?;

    Ok(ExportPage {
        field_headers: parse_field_headers(&raw.field_headers)?,
        next_cursor: parse_end_time(&raw.end_time)?,
        end_of_stream: raw.end_of_stream.unwrap_or(false),
        tickets: raw.results,
    })
}

fn parse_field_headers(value: &Value) -> FetcherResult<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.keys().cloned().collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(name) => Ok(name.clone()),
                other => Err(FetcherError::ParseError(format!(
                    "field_headers entry is not a string: {other}"
                ))),
            })
            .collect(),
        other => Err(FetcherError::ParseError(format!(
            "field_headers has unexpected shape: {other}"
        ))),
    }
}

fn parse_end_time(value: &Value) -> FetcherResult<Option<Cursor>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.parse::<Cursor>().map(Some).map_err(FetcherError::ParseError),
        Value::Number(n) => n
            .as_i64()
            .map(|v| Some(Cursor::new(v)))
            .ok_or_else(|| FetcherError::ParseError(format!("end_time is not an integer: {n}"))),
        other => Err(FetcherError::ParseError(format!(
            "end_time has unexpected shape: {other}"
        ))),
    }
}
