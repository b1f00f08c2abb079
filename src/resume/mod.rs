//! Resume capability for incremental exports
//!
//! The resume point is the last line of an append-only cursor log. An
//! advisory lock next to the log keeps two runs from advancing it at once.

use std::path::PathBuf;

pub mod lock;
pub mod log;

pub use lock::{lock_path, ExportLock};
pub use log::{read_last_cursor, CursorLog};

/// Resume errors
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Log missing or holding no cursor
    #[error("no resume cursor in {}; seed one with `zendesk-export seed`", .0.display())]
    MissingCursor(PathBuf),

    /// Last log line is not a cursor
    #[error("invalid cursor {line:?} at the end of {}", .path.display())]
    InvalidCursor {
        /// Log path
        path: PathBuf,
        /// Offending line
        line: String,
    },

    /// Lock acquisition failed
    #[error("lock error: {0}")]
    LockError(String),
}
