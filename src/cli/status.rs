//! Status command: show where the next export will resume

use chrono::{DateTime, Utc};
use std::path::Path;

use super::{CliError, OutputFormat};
use crate::resume::read_last_cursor;
use crate::Cursor;

/// Print the resume cursor of `log_file`
pub fn execute(log_file: &Path, format: OutputFormat) -> Result<Cursor, CliError> {
    let cursor = read_last_cursor(log_file)?;
    let resumes_at = DateTime::<Utc>::from_timestamp(cursor.value(), 0).map(|dt| dt.to_rfc3339());

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "log_file": log_file.display().to_string(),
                "cursor": cursor.value(),
                "resumes_at": resumes_at,
            })
        ),
        OutputFormat::Human => {
            println!("Log file: {}", log_file.display());
            println!("Resume cursor: {cursor}");
            if let Some(at) = resumes_at {
                println!("Resumes at: {at}");
            }
        }
    }
    Ok(cursor)
}
