//! Delimited ticket writer
//!
//! Every field is quoted and embedded quotes are doubled, so free-text ticket
//! fields survive any delimiter choice. The default delimiter is `~`.

use csv::{QuoteStyle, Writer, WriterBuilder};
use serde_json::Value;
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{OutputError, OutputResult, OutputWriter, TicketWriter};
use crate::TicketRecord;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Render a JSON value as the string written to the sink.
///
/// `null` becomes the empty string, strings are written verbatim, numbers and
/// booleans use their JSON text, arrays and objects are written as compact JSON.
pub fn to_safe_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Delimited-file writer for exported tickets
pub struct CsvTicketWriter {
    writer: Writer<BufWriter<File>>,
    path: PathBuf,
    columns: Option<Vec<String>>,
    header_pending: bool,
    rows_written: u64,
}

impl CsvTicketWriter {
    /// Open the output file.
    ///
    /// # Arguments
    /// * `path` - Output file path; parent directories are created
    /// * `delimiter` - Field delimiter byte
    /// * `overwrite` - Truncate instead of appending
    ///
    /// The header row is written only if the file holds no data once opened.
    pub fn open<P: AsRef<Path>>(path: P, delimiter: u8, overwrite: bool) -> OutputResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), overwrite, "Opening ticket output");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .append(!overwrite)
            .truncate(overwrite)
            .open(path)
            .map_err(|e| OutputError::IoError(format!("Failed to open {}: {e}", path.display())))?;

        let existing_len = file
            .metadata()
            .map_err(|e| OutputError::IoError(format!("Failed to stat output: {e}")))?
            .len();

        if existing_len > 0 {
            terminate_partial_record(&mut file, path)?;
        }

        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(QuoteStyle::Always)
            .has_headers(false)
            .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file));

        debug!(existing_len, "Output opened");

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            columns: None,
            header_pending: existing_len == 0,
            rows_written: 0,
        })
    }

    /// Columns fixed for this run, if any page provided them yet
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Rows written since the file was opened
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Close a record left unfinished by a killed run so appended rows start on
/// a fresh line.
///
/// Complete records hold an even number of `"` bytes, so an odd count means
/// the file ends inside a quoted field.
fn terminate_partial_record(file: &mut File, path: &Path) -> OutputResult<()> {
    let io_error = |context: &str, e: std::io::Error| {
        OutputError::IoError(format!("{context} {}: {e}", path.display()))
    };

    file.seek(SeekFrom::Start(0))
        .map_err(|e| io_error("Failed to seek", e))?;

    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut quotes = 0u64;
    let mut last = None;
    loop {
        let n = file.read(&mut buf).map_err(|e| io_error("Failed to read", e))?;
        if n == 0 {
            break;
        }
        quotes += buf[..n].iter().filter(|&&b| b == b'"').count() as u64;
        last = Some(buf[n - 1]);
    }

    let repair: &[u8] = match (quotes % 2 == 1, last) {
        (true, _) => b"\"\n",
        (false, Some(b'\n')) | (false, None) => return Ok(()),
        (false, Some(_)) => b"\n",
    };

    warn!(
        path = %path.display(),
        open_quote = quotes % 2 == 1,
        "Output ends with an unfinished row; terminating it before appending"
    );
    file.write_all(repair)
        .map_err(|e| io_error("Failed to write", e))
}

impl TicketWriter for CsvTicketWriter {
    fn set_columns(&mut self, columns: Vec<String>) -> OutputResult<()> {
        // An empty page without headers says nothing about the schema
        if columns.is_empty() {
            return Ok(());
        }

        if let Some(existing) = &self.columns {
            if *existing != columns {
                warn!(
                    expected = existing.len(),
                    got = columns.len(),
                    "Field headers changed mid-export; keeping the first page's columns"
                );
            }
            return Ok(());
        }

        if self.header_pending {
            self.writer
                .write_record(&columns)
                .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;
            self.header_pending = false;
            debug!(columns = columns.len(), "Header row written");
        }

        self.columns = Some(columns);
        Ok(())
    }

    fn write_ticket(&mut self, ticket: &TicketRecord) -> OutputResult<()> {
        if self.columns.is_none() {
            self.set_columns(ticket.keys().cloned().collect())?;
        }
        let Some(columns) = self.columns.as_ref() else {
            return Ok(());
        };

        let dropped = ticket.keys().filter(|key| !columns.contains(*key)).count();
        if dropped > 0 {
            debug!(dropped, "Ticket has fields outside the header; dropping them");
        }

        let row = columns
            .iter()
            .map(|column| ticket.get(column).map(to_safe_string).unwrap_or(Cow::Borrowed("")));

        self.writer
            .write_record(row.map(|field| field.into_owned()))
            .map_err(|e| OutputError::CsvError(format!("Failed to write ticket: {e}")))?;

        self.rows_written += 1;
        Ok(())
    }
}

impl OutputWriter for CsvTicketWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))?;
        self.writer
            .get_ref()
            .get_ref()
            .sync_data()
            .map_err(|e| OutputError::FlushError(format!("Failed to sync: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!(rows = self.rows_written, "Closing ticket output");

        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        info!(
            path = %self.path.display(),
            rows = self.rows_written,
            "Ticket output closed"
        );
        Ok(())
    }
}
