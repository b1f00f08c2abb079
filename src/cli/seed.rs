//! Seed command: write the first cursor of a new export
//!
//! The export refuses to guess a starting point, so a fresh log has to be
//! seeded with either an explicit time or a relative one ("3 days ago").

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{ArgGroup, Parser};

use super::CliError;
use crate::resume::{read_last_cursor, CursorLog, ResumeError};
use crate::Cursor;

/// Seed command arguments
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("origin")
        .required(true)
        .multiple(true)
        .args(["start_time", "days_ago", "hours_ago"])
))]
pub struct SeedArgs {
    /// Start time: Unix seconds, YYYY-MM-DD (midnight UTC) or RFC3339
    #[arg(long, conflicts_with_all = ["days_ago", "hours_ago"])]
    pub start_time: Option<String>,

    /// Start this many days before now
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=36_500))]
    pub days_ago: Option<u32>,

    /// Start this many hours before now (added to --days-ago)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=876_000))]
    pub hours_ago: Option<u32>,

    /// Append even if the log already holds a cursor
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

impl SeedArgs {
    /// Cursor this invocation seeds, relative to `now`
    pub fn cursor(&self, now: DateTime<Utc>) -> Result<Cursor, CliError> {
        match &self.start_time {
            Some(input) => parse_start_time(input),
            None => Ok(delta_start_time(
                now,
                self.days_ago.unwrap_or(0),
                self.hours_ago.unwrap_or(0),
            )),
        }
    }

    /// Execute the seed command
    pub fn execute(&self, log_file: &std::path::Path) -> Result<Cursor, CliError> {
        if !self.force {
            match read_last_cursor(log_file) {
                Ok(existing) => {
                    return Err(CliError::InvalidArgument(format!(
                        "{} already resumes from {existing}; pass --force to append a new starting point",
                        log_file.display()
                    )))
                }
                Err(ResumeError::MissingCursor(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let cursor = self.cursor(Utc::now())?;
        CursorLog::seed(log_file, cursor)?;
        println!("Seeded {} with cursor {}", log_file.display(), cursor);
        Ok(cursor)
    }
}

/// Cursor for a point `days` days and `hours` hours before `now`
pub fn delta_start_time(now: DateTime<Utc>, days: u32, hours: u32) -> Cursor {
    let start = now - Duration::days(i64::from(days)) - Duration::hours(i64::from(hours));
    Cursor::new(start.timestamp())
}

/// Parse a start time from Unix seconds, YYYY-MM-DD or RFC3339.
///
/// RFC3339 input without a timezone designator is taken as UTC.
pub fn parse_start_time(input: &str) -> Result<Cursor, CliError> {
    let input = input.trim();

    if let Ok(secs) = input.parse::<i64>() {
        if secs < 0 {
            return Err(CliError::InvalidArgument(format!(
                "start time must not be negative: {secs}"
            )));
        }
        return Ok(Cursor::new(secs));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(Cursor::new(dt.timestamp()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{input}Z")) {
        return Ok(Cursor::new(dt.timestamp()));
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid start time {input:?}: {e}")))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidArgument("Invalid start time".to_string()))?;
    Ok(Cursor::new(datetime.and_utc().timestamp()))
}
