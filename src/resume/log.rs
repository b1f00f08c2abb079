//! Append-only cursor log
//!
//! One cursor per line, newline-terminated. Lines are never rewritten; the
//! last non-blank line is the resume point.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::ResumeError;
use crate::Cursor;

/// Bytes read from the end of the log when looking for the last cursor
const TAIL_BYTES: u64 = 4096;

fn io_error(context: &str, path: &Path, e: std::io::Error) -> ResumeError {
    ResumeError::IoError(format!("{context} {}: {e}", path.display()))
}

/// Read the resume cursor (the last non-blank line) from a log file
///
/// # Errors
/// `MissingCursor` if the file is absent or holds only blank lines,
/// `InvalidCursor` if the last line is not an integer.
pub fn read_last_cursor(path: &Path) -> Result<Cursor, ResumeError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ResumeError::MissingCursor(path.to_path_buf()))
        }
        Err(e) => return Err(io_error("Failed to open", path, e)),
    };

    let len = file
        .metadata()
        .map_err(|e| io_error("Failed to stat", path, e))?
        .len();
    let start = len.saturating_sub(TAIL_BYTES);
    file.seek(SeekFrom::Start(start))
        .map_err(|e| io_error("Failed to seek", path, e))?;

    let mut tail = Vec::with_capacity((len - start) as usize);
    file.read_to_end(&mut tail)
        .map_err(|e| io_error("Failed to read", path, e))?;
    let tail = String::from_utf8_lossy(&tail);

    let line = match last_line(&tail) {
        // A line starting at the tail boundary may have been cut off
        Some((offset, line)) if start == 0 || offset > 0 => line.to_string(),
        _ if start > 0 => {
            let full = std::fs::read_to_string(path)
                .map_err(|e| io_error("Failed to read", path, e))?;
            match last_line(&full) {
                Some((_, line)) => line.to_string(),
                None => return Err(ResumeError::MissingCursor(path.to_path_buf())),
            }
        }
        _ => return Err(ResumeError::MissingCursor(path.to_path_buf())),
    };

    line.parse::<Cursor>()
        .map_err(|_| ResumeError::InvalidCursor {
            path: path.to_path_buf(),
            line,
        })
}

/// Last non-blank line and the byte offset where it starts
fn last_line(text: &str) -> Option<(usize, &str)> {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return None;
    }
    let offset = trimmed.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Some((offset, trimmed[offset..].trim()))
}

fn open_for_append(path: &Path) -> Result<File, ResumeError> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error("Failed to open", path, e))?;

    // A hand-edited log may lack the final newline
    let len = file
        .metadata()
        .map_err(|e| io_error("Failed to stat", path, e))?
        .len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .and_then(|_| file.read_exact(&mut last))
            .map_err(|e| io_error("Failed to read", path, e))?;
        if last[0] != b'\n' {
            file.write_all(b"\n")
                .map_err(|e| io_error("Failed to write", path, e))?;
        }
    }

    Ok(file)
}

/// Open cursor log positioned for appending
pub struct CursorLog {
    path: PathBuf,
    file: File,
    last: Cursor,
    appended: u64,
}

impl CursorLog {
    /// Open an existing log and read its resume cursor.
    ///
    /// There is no default cursor: a missing or empty log is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ResumeError> {
        let path = path.as_ref();
        let last = read_last_cursor(path)?;
        let file = open_for_append(path)?;

        info!(path = %path.display(), cursor = %last, "Loaded resume cursor");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            last,
            appended: 0,
        })
    }

    /// Append a starting cursor to a log, creating it if needed
    pub fn seed<P: AsRef<Path>>(path: P, cursor: Cursor) -> Result<(), ResumeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| io_error("Failed to create directory for", path, e))?;
        }

        let mut file = open_for_append(path)?;
        write_cursor(&mut file, path, cursor)?;
        file.sync_all()
            .map_err(|e| io_error("Failed to sync", path, e))?;

        info!(path = %path.display(), cursor = %cursor, "Seeded cursor log");
        Ok(())
    }

    /// Current resume cursor
    pub fn last_cursor(&self) -> Cursor {
        self.last
    }

    /// Number of cursors appended through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a cursor and sync it to disk
    pub fn append(&mut self, cursor: Cursor) -> Result<(), ResumeError> {
        write_cursor(&mut self.file, &self.path, cursor)?;
        self.file
            .sync_data()
            .map_err(|e| io_error("Failed to sync", &self.path, e))?;

        self.last = cursor;
        self.appended += 1;
        debug!(cursor = %cursor, appended = self.appended, "Cursor appended");
        Ok(())
    }

    /// Sync and close the log
    pub fn close(self) -> Result<(), ResumeError> {
        self.file
            .sync_all()
            .map_err(|e| io_error("Failed to sync", &self.path, e))
    }
}

fn write_cursor(file: &mut File, path: &Path, cursor: Cursor) -> Result<(), ResumeError> {
    file.write_all(format!("{cursor}\n").as_bytes())
        .map_err(|e| io_error("Failed to write", path, e))
}
